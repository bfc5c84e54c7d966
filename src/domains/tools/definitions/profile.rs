//! User profile tools.

use serde_json::Value;

use super::common::{EmptyParams, FixedTool, register_fixed};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::garmin::Operation;

const PROFILE_TOOLS: [FixedTool; 2] = [
    (
        "get_user_profile",
        "Get user profile information",
        || Operation::UserProfile,
        "No user profile information found.",
    ),
    (
        "get_userprofile_settings",
        "Get user profile settings",
        || Operation::UserProfileSettings,
        "No user profile settings found.",
    ),
];

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add("get_full_name", "Get user's full name from profile", get_full_name)
        .add(
            "get_unit_system",
            "Get user's preferred unit system from profile",
            get_unit_system,
        );
    register_fixed(registry, &PROFILE_TOOLS);
}

// Both come back as bare strings and are shown as-is.
async fn get_full_name(ctx: ToolContext, _: EmptyParams) -> ToolResult<Value> {
    ctx.gateway.call(Operation::FullName).await
}

async fn get_unit_system(ctx: ToolContext, _: EmptyParams) -> ToolResult<Value> {
    ctx.gateway.call(Operation::UnitSystem).await
}

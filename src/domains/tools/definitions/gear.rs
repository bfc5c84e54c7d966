//! Gear tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::or_message;
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::sanitize_string;
use crate::garmin::Operation;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UserProfileParams {
    /// User profile ID (can be obtained from get_device_last_used, will be sanitized)
    pub user_profile_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GearStatsParams {
    /// UUID of the gear item (will be sanitized)
    pub gear_uuid: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add("get_gear", "Get all gear registered with the user account", get_gear)
        .add("get_gear_defaults", "Get default gear settings", get_gear_defaults)
        .add("get_gear_stats", "Get statistics for specific gear", get_gear_stats);
}

async fn get_gear(ctx: ToolContext, p: UserProfileParams) -> ToolResult<Value> {
    let user_profile_id = sanitize_string(&p.user_profile_id, "user_profile_id")?;
    let gear = ctx.gateway.call(Operation::Gear { user_profile_id }).await?;
    Ok(or_message(gear, || "No gear found.".to_string()))
}

async fn get_gear_defaults(ctx: ToolContext, p: UserProfileParams) -> ToolResult<Value> {
    let user_profile_id = sanitize_string(&p.user_profile_id, "user_profile_id")?;
    let defaults = ctx.gateway.call(Operation::GearDefaults { user_profile_id }).await?;
    Ok(or_message(defaults, || "No gear defaults found.".to_string()))
}

async fn get_gear_stats(ctx: ToolContext, p: GearStatsParams) -> ToolResult<Value> {
    let gear_uuid = sanitize_string(&p.gear_uuid, "gear_uuid")?;
    let stats = ctx
        .gateway
        .call(Operation::GearStats { gear_uuid: gear_uuid.clone() })
        .await?;
    Ok(or_message(stats, || format!("No stats found for gear with UUID {gear_uuid}.")))
}

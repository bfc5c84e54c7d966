//! Goals, records, badges and challenges.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{DateRangeParams, FixedTool, or_message, register_fixed, to_u32};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{validate_choice, validate_count, validate_date_range};
use crate::garmin::Operation;

const GOAL_TYPES: &[&str] = &["active", "future", "past"];

const RECORD_TOOLS: [FixedTool; 3] = [
    (
        "get_personal_record",
        "Get personal records for user",
        || Operation::PersonalRecord,
        "No personal records found.",
    ),
    (
        "get_earned_badges",
        "Get earned badges for user",
        || Operation::EarnedBadges,
        "No earned badges found.",
    ),
    (
        "get_race_predictions",
        "Get race predictions for user",
        || Operation::RacePredictions,
        "No race predictions found.",
    ),
];

/// Paged badge challenge listings. These start counting at 1.
type BadgeTool = (&'static str, &'static str, fn(u32, u32) -> Operation, &'static str);

const BADGE_TOOLS: [BadgeTool; 3] = [
    (
        "get_available_badge_challenges",
        "Get available badge challenges data",
        |start, limit| Operation::AvailableBadgeChallenges { start, limit },
        "No available badge challenges found.",
    ),
    (
        "get_badge_challenges",
        "Get badge challenges data",
        |start, limit| Operation::BadgeChallenges { start, limit },
        "No badge challenges found.",
    ),
    (
        "get_non_completed_badge_challenges",
        "Get non-completed badge challenges data",
        |start, limit| Operation::NonCompletedBadgeChallenges { start, limit },
        "No non-completed badge challenges found.",
    ),
];

fn default_goal_type() -> String {
    "active".to_string()
}

fn default_limit() -> i64 {
    100
}

fn default_badge_start() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GoalsParams {
    /// Type of goals to retrieve. Options: "active", "future", or "past"
    #[serde(default = "default_goal_type")]
    pub goal_type: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AdhocChallengesParams {
    /// Starting index for challenges retrieval (must be >= 0)
    #[serde(default)]
    pub start: i64,

    /// Maximum number of challenges to retrieve (must be positive)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BadgeChallengesParams {
    /// Starting index for challenges retrieval (starts at 1, must be positive)
    #[serde(default = "default_badge_start")]
    pub start: i64,

    /// Maximum number of challenges to retrieve (must be positive)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add(
            "get_goals",
            "Get Garmin Connect goals (active, future, or past)",
            get_goals,
        )
        .add(
            "get_adhoc_challenges",
            "Get adhoc challenges data",
            get_adhoc_challenges,
        )
        .add(
            "get_inprogress_virtual_challenges",
            "Get in-progress virtual challenges/expeditions between dates",
            get_inprogress_virtual_challenges,
        );

    register_fixed(registry, &RECORD_TOOLS);

    for (name, description, operation, missing) in BADGE_TOOLS {
        registry.add(name, description, move |ctx, p: BadgeChallengesParams| {
            badge_challenges(ctx, p, operation, missing)
        });
    }
}

async fn get_goals(ctx: ToolContext, p: GoalsParams) -> ToolResult<Value> {
    let goal_type = validate_choice(&p.goal_type, "goal_type", GOAL_TYPES)?;
    let goals = ctx
        .gateway
        .call(Operation::Goals { goal_type: goal_type.clone() })
        .await?;
    Ok(or_message(goals, || format!("No {goal_type} goals found.")))
}

async fn get_adhoc_challenges(ctx: ToolContext, p: AdhocChallengesParams) -> ToolResult<Value> {
    let start = to_u32(validate_count(p.start, "start", true)?, "start")?;
    let limit = to_u32(validate_count(p.limit, "limit", false)?, "limit")?;
    let challenges = ctx
        .gateway
        .call(Operation::AdhocChallenges { start, limit })
        .await?;
    Ok(or_message(challenges, || "No adhoc challenges found.".to_string()))
}

async fn badge_challenges(
    ctx: ToolContext,
    p: BadgeChallengesParams,
    operation: fn(u32, u32) -> Operation,
    missing: &'static str,
) -> ToolResult<Value> {
    let start = to_u32(validate_count(p.start, "start", false)?, "start")?;
    let limit = to_u32(validate_count(p.limit, "limit", false)?, "limit")?;
    let challenges = ctx.gateway.call(operation(start, limit)).await?;
    Ok(or_message(challenges, || missing.to_string()))
}

async fn get_inprogress_virtual_challenges(
    ctx: ToolContext,
    p: DateRangeParams,
) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let challenges = ctx
        .gateway
        .call(Operation::InProgressVirtualChallenges {
            start_date: start_date.clone(),
            end_date: end_date.clone(),
        })
        .await?;
    Ok(or_message(challenges, || {
        format!("No in-progress virtual challenges found between {start_date} and {end_date}.")
    }))
}

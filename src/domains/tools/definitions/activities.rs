//! Activity tools: recent activity list, date searches and per-activity detail.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{ActivityIdParams, DateParams, field_text, or_message, to_u32};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{
    resolve_date, sanitize_string, validate_count, validate_date_range, validate_id,
};
use crate::garmin::Operation;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListActivitiesParams {
    /// Number of recent activities to list (must be positive, default: 5)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    5
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ActivitiesByDateParams {
    /// Start date in YYYY-MM-DD format
    pub start_date: String,

    /// End date in YYYY-MM-DD format
    pub end_date: String,

    /// Optional activity type filter (e.g., cycling, running, swimming)
    #[serde(default)]
    pub activity_type: String,
}

type DetailTool = (&'static str, &'static str, fn(i64) -> Operation, &'static str);

const DETAIL_TOOLS: [DetailTool; 7] = [
    (
        "get_activity_splits",
        "Get splits for an activity",
        |activity_id| Operation::ActivitySplits { activity_id },
        "No splits found",
    ),
    (
        "get_activity_typed_splits",
        "Get typed splits for an activity",
        |activity_id| Operation::ActivityTypedSplits { activity_id },
        "No typed splits found",
    ),
    (
        "get_activity_split_summaries",
        "Get split summaries for an activity",
        |activity_id| Operation::ActivitySplitSummaries { activity_id },
        "No split summaries found",
    ),
    (
        "get_activity_weather",
        "Get weather data for an activity",
        |activity_id| Operation::ActivityWeather { activity_id },
        "No weather data found",
    ),
    (
        "get_activity_hr_in_timezones",
        "Get heart rate data in different time zones for an activity",
        |activity_id| Operation::ActivityHrInTimezones { activity_id },
        "No heart rate time zone data found",
    ),
    (
        "get_activity_gear",
        "Get gear data used for an activity",
        |activity_id| Operation::ActivityGear { activity_id },
        "No gear data found",
    ),
    (
        "get_activity_exercise_sets",
        "Get exercise sets for strength training activities",
        |activity_id| Operation::ActivityExerciseSets { activity_id },
        "No exercise sets found",
    ),
];

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add("list_activities", "List recent Garmin activities.", list_activities)
        .add(
            "get_activities_by_date",
            "Get activities data between specified dates, optionally filtered by activity type",
            get_activities_by_date,
        )
        .add(
            "get_activities_fordate",
            "Get activities for a specific date",
            get_activities_fordate,
        )
        .add("get_activity", "Get basic activity information", get_activity);

    for (name, description, operation, missing) in DETAIL_TOOLS {
        registry.add(name, description, move |ctx, p: ActivityIdParams| {
            activity_detail(ctx, p, operation, missing)
        });
    }
}

async fn list_activities(ctx: ToolContext, p: ListActivitiesParams) -> ToolResult<Value> {
    let limit = to_u32(validate_count(p.limit, "limit", false)?, "limit")?;
    let activities = ctx.gateway.call(Operation::Activities { start: 0, limit }).await?;
    Ok(Value::String(summarize_activities(&activities)))
}

async fn get_activities_by_date(ctx: ToolContext, p: ActivitiesByDateParams) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let activity_type = if p.activity_type.is_empty() {
        None
    } else {
        Some(sanitize_string(&p.activity_type, "activity_type")?)
    };

    let activities = ctx
        .gateway
        .call(Operation::ActivitiesByDate {
            start_date: start_date.clone(),
            end_date: end_date.clone(),
            activity_type: activity_type.clone(),
        })
        .await?;

    Ok(or_message(activities, || {
        let mut msg = format!("No activities found between {start_date} and {end_date}");
        if let Some(t) = &activity_type {
            msg.push_str(&format!(" for activity type '{t}'"));
        }
        msg
    }))
}

async fn get_activities_fordate(ctx: ToolContext, p: DateParams) -> ToolResult<Value> {
    let date = resolve_date(p.date.as_deref(), "date")?;
    let activities = ctx
        .gateway
        .call(Operation::ActivitiesForDate { date: date.clone() })
        .await?;
    Ok(or_message(activities, || format!("No activities found for {date}")))
}

async fn get_activity(ctx: ToolContext, p: ActivityIdParams) -> ToolResult<Value> {
    let activity_id = validate_id(p.activity_id, "activity_id")?;
    let activity = ctx.gateway.call(Operation::Activity { activity_id }).await?;
    Ok(or_message(activity, || format!("No activity found with ID {activity_id}")))
}

async fn activity_detail(
    ctx: ToolContext,
    p: ActivityIdParams,
    operation: fn(i64) -> Operation,
    missing: &'static str,
) -> ToolResult<Value> {
    let activity_id = validate_id(p.activity_id, "activity_id")?;
    let value = ctx.gateway.call(operation(activity_id)).await?;
    Ok(or_message(value, || format!("{missing} for activity with ID {activity_id}")))
}

/// Plain-text digest of an activity list.
fn summarize_activities(activities: &Value) -> String {
    let list = match activities.as_array() {
        Some(list) if !list.is_empty() => list,
        _ => return "No activities found.".to_string(),
    };

    let mut out = format!("Last {} activities:\n\n", list.len());
    for (idx, activity) in list.iter().enumerate() {
        out.push_str(&format!("--- Activity {} ---\n", idx + 1));
        out.push_str(&format!("Activity: {}\n", field_text(activity.get("activityName"))));
        out.push_str(&format!(
            "Type: {}\n",
            field_text(activity.pointer("/activityType/typeKey"))
        ));
        out.push_str(&format!("Date: {}\n", field_text(activity.get("startTimeLocal"))));
        out.push_str(&format!("ID: {}\n\n", field_text(activity.get("activityId"))));
    }
    out
}

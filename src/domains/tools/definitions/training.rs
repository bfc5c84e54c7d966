//! Training and performance tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{ActivityIdParams, DateRangeParams, RequiredDateParams, or_message};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{
    sanitize_string, validate_date, validate_date_range, validate_id,
};
use crate::garmin::Operation;

type DayTool = (&'static str, &'static str, fn(String) -> Operation, &'static str);
type ScoreTool = (&'static str, &'static str, fn(String, String) -> Operation, &'static str);

const DAY_TOOLS: [DayTool; 3] = [
    (
        "get_max_metrics",
        "Get max metrics data (like VO2 Max and fitness age)",
        |date| Operation::MaxMetrics { date },
        "max metrics data",
    ),
    (
        "get_hrv_data",
        "Get Heart Rate Variability (HRV) data",
        |date| Operation::HrvData { date },
        "HRV data",
    ),
    (
        "get_fitnessage_data",
        "Get fitness age data",
        |date| Operation::FitnessAgeData { date },
        "fitness age data",
    ),
];

const SCORE_TOOLS: [ScoreTool; 2] = [
    (
        "get_hill_score",
        "Get hill score data between dates",
        |start_date, end_date| Operation::HillScore { start_date, end_date },
        "hill score data",
    ),
    (
        "get_endurance_score",
        "Get endurance score data between dates",
        |start_date, end_date| Operation::EnduranceScore { start_date, end_date },
        "endurance score data",
    ),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProgressSummaryParams {
    /// Start date in YYYY-MM-DD format
    pub start_date: String,

    /// End date in YYYY-MM-DD format
    pub end_date: String,

    /// Metric to get progress for (e.g., "elevationGain", "duration", "distance", "movingDuration")
    pub metric: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add(
            "get_progress_summary_between_dates",
            "Get progress summary for a metric between dates",
            get_progress_summary_between_dates,
        )
        .add(
            "get_training_effect",
            "Get training effect data for a specific activity",
            get_training_effect,
        )
        .add("request_reload", "Request reload of epoch data", request_reload);

    for (name, description, operation, what) in DAY_TOOLS {
        registry.add(name, description, move |ctx, p: RequiredDateParams| {
            day(ctx, p, operation, what)
        });
    }

    for (name, description, operation, what) in SCORE_TOOLS {
        registry.add(name, description, move |ctx, p: DateRangeParams| {
            score(ctx, p, operation, what)
        });
    }
}

async fn get_progress_summary_between_dates(
    ctx: ToolContext,
    p: ProgressSummaryParams,
) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let metric = sanitize_string(&p.metric, "metric")?;
    let summary = ctx
        .gateway
        .call(Operation::ProgressSummary {
            start_date: start_date.clone(),
            end_date: end_date.clone(),
            metric: metric.clone(),
        })
        .await?;
    Ok(or_message(summary, || {
        format!("No progress summary found for {metric} between {start_date} and {end_date}.")
    }))
}

async fn get_training_effect(ctx: ToolContext, p: ActivityIdParams) -> ToolResult<Value> {
    let activity_id = validate_id(p.activity_id, "activity_id")?;
    let effect = ctx.gateway.call(Operation::TrainingEffect { activity_id }).await?;
    Ok(or_message(effect, || {
        format!("No training effect data found for activity with ID {activity_id}.")
    }))
}

async fn request_reload(ctx: ToolContext, p: RequiredDateParams) -> ToolResult<Value> {
    let date = validate_date(&p.date, "date")?;
    ctx.gateway.call(Operation::RequestReload { date }).await
}

async fn day(
    ctx: ToolContext,
    p: RequiredDateParams,
    operation: fn(String) -> Operation,
    what: &'static str,
) -> ToolResult<Value> {
    let date = validate_date(&p.date, "date")?;
    let value = ctx.gateway.call(operation(date.clone())).await?;
    Ok(or_message(value, || format!("No {what} found for {date}.")))
}

async fn score(
    ctx: ToolContext,
    p: DateRangeParams,
    operation: fn(String, String) -> Operation,
    what: &'static str,
) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let value = ctx
        .gateway
        .call(operation(start_date.clone(), end_date.clone()))
        .await?;
    Ok(or_message(value, || {
        format!("No {what} found between {start_date} and {end_date}.")
    }))
}

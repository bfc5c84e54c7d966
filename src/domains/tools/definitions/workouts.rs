//! Workout library, scheduled and training plan workouts, and uploads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::common::{DateRangeParams, EmptyParams, or_message};
use crate::core::security::validate_upload_path;
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::serialization::is_empty_payload;
use crate::domains::tools::validation::{
    sanitize_string, validate_date, validate_date_range, validate_id,
};
use crate::garmin::Operation;

const UPLOAD_DISABLED: &str = "Activity upload from file is not supported in this MCP server \
     implementation. Please use the Garmin Connect web interface or mobile app.";

const SCHEDULED_WORKOUTS_QUERY: &str = "query($startDate: String!, $endDate: String!) { \
     workoutScheduleSummariesScalar(startDate: $startDate, endDate: $endDate) }";

const TRAINING_PLAN_QUERY: &str =
    "query($calendarDate: String!, $lang: String!, $firstDayOfWeek: String!) { \
     trainingPlanScalar(calendarDate: $calendarDate, lang: $lang, firstDayOfWeek: $firstDayOfWeek) }";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WorkoutIdParams {
    /// ID of the workout (must be positive integer)
    pub workout_id: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UploadWorkoutParams {
    /// JSON string containing the workout definition
    pub workout_json: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UploadActivityParams {
    /// Path to the activity file (.fit, .gpx, .tcx), inside the configured upload directory
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TrainingPlanParams {
    /// Date in YYYY-MM-DD format
    pub calendar_date: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add("get_workouts", "Get all workouts", get_workouts)
        .add(
            "get_workout_by_id",
            "Get details for a specific workout",
            get_workout_by_id,
        )
        .add(
            "download_workout",
            "Download a workout as a FIT file (reports whether the data is available)",
            download_workout,
        )
        .add(
            "upload_workout",
            "Upload a workout from JSON data",
            upload_workout,
        )
        .add_blocking(
            "upload_activity",
            "Upload an activity from a .fit, .gpx or .tcx file in the upload directory",
            upload_activity,
        )
        .add(
            "get_scheduled_workouts",
            "Get workouts scheduled on the Garmin Connect calendar between two dates",
            get_scheduled_workouts,
        )
        .add(
            "get_training_plan_workouts",
            "Get training plan workouts for a specific date",
            get_training_plan_workouts,
        );
}

async fn get_workouts(ctx: ToolContext, _: EmptyParams) -> ToolResult<Value> {
    let workouts = ctx.gateway.call(Operation::Workouts).await?;
    Ok(or_message(workouts, || "No workouts found.".to_string()))
}

async fn get_workout_by_id(ctx: ToolContext, p: WorkoutIdParams) -> ToolResult<Value> {
    let workout_id = validate_id(p.workout_id, "workout_id")?;
    let workout = ctx.gateway.call(Operation::WorkoutById { workout_id }).await?;
    Ok(or_message(workout, || format!("No workout found with ID {workout_id}.")))
}

/// The client hands back the FIT bytes base64 encoded. They are not relayed
/// to the model; only their availability and size are.
async fn download_workout(ctx: ToolContext, p: WorkoutIdParams) -> ToolResult<Value> {
    let workout_id = validate_id(p.workout_id, "workout_id")?;
    let data = ctx.gateway.call(Operation::DownloadWorkout { workout_id }).await?;

    if is_empty_payload(&data) {
        return Ok(Value::String(format!(
            "No workout data found for workout with ID {workout_id}."
        )));
    }

    let size = data.as_str().and_then(|s| STANDARD.decode(s).ok()).map(|b| b.len());
    let message = match size {
        Some(bytes) => format!(
            "Workout data for ID {workout_id} is available ({bytes} bytes). The data is in FIT \
             format and would need to be saved to a file."
        ),
        None => format!(
            "Workout data for ID {workout_id} is available. The data is in FIT format and would \
             need to be saved to a file."
        ),
    };
    Ok(Value::String(message))
}

async fn upload_workout(ctx: ToolContext, p: UploadWorkoutParams) -> ToolResult<Value> {
    let raw = sanitize_string(&p.workout_json, "workout_json")?;
    let workout: Value = serde_json::from_str(&raw)
        .map_err(|e| ToolError::validation(format!("workout_json is not valid JSON: {e}")))?;
    if !workout.is_object() {
        return Err(ToolError::validation("workout_json must be a JSON object"));
    }
    ctx.gateway.call(Operation::UploadWorkout { workout }).await
}

fn upload_activity(ctx: ToolContext, p: UploadActivityParams) -> ToolResult<Value> {
    let Some(root) = ctx.config.garmin.upload_root.as_deref() else {
        return Ok(Value::String(UPLOAD_DISABLED.to_string()));
    };

    let file_path = sanitize_string(&p.file_path, "file_path")?;
    let path = validate_upload_path(&file_path, root).map_err(|e| {
        warn!("Rejected activity upload path {}: {}", file_path, e);
        ToolError::validation(e.to_string())
    })?;

    info!("Uploading activity file {}", path.display());
    ctx.gateway.call_blocking(&Operation::UploadActivity { path })
}

async fn get_scheduled_workouts(ctx: ToolContext, p: DateRangeParams) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let query = json!({
        "query": SCHEDULED_WORKOUTS_QUERY,
        "variables": { "startDate": start_date, "endDate": end_date },
    });

    let result = ctx.gateway.call(Operation::GraphQl { query }).await?;
    let Some(data) = result.get("data") else {
        return Ok(json!("No scheduled workouts found or error querying data."));
    };

    let scheduled = data
        .get("workoutScheduleSummariesScalar")
        .cloned()
        .unwrap_or(Value::Null);
    Ok(or_message(scheduled, || {
        format!("No workouts scheduled between {start_date} and {end_date}.")
    }))
}

async fn get_training_plan_workouts(ctx: ToolContext, p: TrainingPlanParams) -> ToolResult<Value> {
    let calendar_date = validate_date(&p.calendar_date, "calendar_date")?;
    let query = json!({
        "query": TRAINING_PLAN_QUERY,
        "variables": {
            "calendarDate": calendar_date,
            "lang": "en-US",
            "firstDayOfWeek": "monday",
        },
    });

    let result = ctx.gateway.call(Operation::GraphQl { query }).await?;
    let Some(data) = result.get("data") else {
        return Ok(json!("No training plan data found or error querying data."));
    };

    let plan = data.get("trainingPlanScalar").cloned().unwrap_or(Value::Null);
    let has_workouts = plan
        .get("trainingPlanWorkoutScheduleDTOS")
        .and_then(Value::as_array)
        .is_some_and(|w| !w.is_empty());

    if has_workouts {
        Ok(plan)
    } else {
        Ok(Value::String(format!(
            "No training plan workouts scheduled for {calendar_date}."
        )))
    }
}

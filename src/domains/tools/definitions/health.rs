//! Health and wellness tools.
//!
//! Almost every tool here reads one day of data. Those are declared as a
//! table and share one handler; only body composition has its own shape.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{DateParams, DateRangeParams, or_message};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{resolve_date, validate_date, validate_date_range};
use crate::garmin::Operation;

type DailyTool = (&'static str, &'static str, fn(String) -> Operation, &'static str);
type RangeTool = (&'static str, &'static str, fn(String, String) -> Operation, &'static str);

const DAILY_TOOLS: [DailyTool; 17] = [
    ("get_stats", "Get daily activity stats", |date| Operation::Stats { date }, "stats"),
    (
        "get_user_summary",
        "Get user summary data (compatible with garminconnect-ha)",
        |date| Operation::UserSummary { date },
        "user summary",
    ),
    (
        "get_stats_and_body",
        "Get stats and body composition data",
        |date| Operation::StatsAndBody { date },
        "stats and body composition data",
    ),
    ("get_steps_data", "Get steps data", |date| Operation::StepsData { date }, "steps data"),
    (
        "get_training_readiness",
        "Get training readiness data",
        |date| Operation::TrainingReadiness { date },
        "training readiness data",
    ),
    (
        "get_body_battery_events",
        "Get body battery events data",
        |date| Operation::BodyBatteryEvents { date },
        "body battery events",
    ),
    ("get_floors", "Get floors climbed data", |date| Operation::Floors { date }, "floors data"),
    (
        "get_training_status",
        "Get training status data",
        |date| Operation::TrainingStatus { date },
        "training status data",
    ),
    (
        "get_rhr_day",
        "Get resting heart rate data",
        |date| Operation::RhrDay { date },
        "resting heart rate data",
    ),
    (
        "get_heart_rates",
        "Get heart rate data",
        |date| Operation::HeartRates { date },
        "heart rate data",
    ),
    (
        "get_hydration_data",
        "Get hydration data",
        |date| Operation::HydrationData { date },
        "hydration data",
    ),
    ("get_sleep_data", "Get sleep data", |date| Operation::SleepData { date }, "sleep data"),
    ("get_stress_data", "Get stress data", |date| Operation::StressData { date }, "stress data"),
    (
        "get_respiration_data",
        "Get respiration data",
        |date| Operation::RespirationData { date },
        "respiration data",
    ),
    (
        "get_spo2_data",
        "Get SpO2 (blood oxygen) data",
        |date| Operation::Spo2Data { date },
        "SpO2 data",
    ),
    (
        "get_all_day_stress",
        "Get all-day stress data",
        |date| Operation::AllDayStress { date },
        "all-day stress data",
    ),
    (
        "get_all_day_events",
        "Get daily wellness events data",
        |date| Operation::AllDayEvents { date },
        "daily wellness events",
    ),
];

const RANGE_TOOLS: [RangeTool; 3] = [
    (
        "get_daily_steps",
        "Get steps data for a date range",
        |start_date, end_date| Operation::DailySteps { start_date, end_date },
        "daily steps data",
    ),
    (
        "get_body_battery",
        "Get body battery data",
        |start_date, end_date| Operation::BodyBattery { start_date, end_date },
        "body battery data",
    ),
    (
        "get_blood_pressure",
        "Get blood pressure data",
        |start_date, end_date| Operation::BloodPressure { start_date, end_date },
        "blood pressure data",
    ),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BodyCompositionParams {
    /// Date in YYYY-MM-DD format or start date if end_date provided
    pub start_date: String,

    /// Optional end date in YYYY-MM-DD format for date range
    #[serde(default)]
    pub end_date: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    for (name, description, operation, what) in DAILY_TOOLS {
        registry.add(name, description, move |ctx, p: DateParams| {
            daily(ctx, p, operation, what)
        });
    }

    for (name, description, operation, what) in RANGE_TOOLS {
        registry.add(name, description, move |ctx, p: DateRangeParams| {
            range(ctx, p, operation, what)
        });
    }

    registry.add(
        "get_body_composition",
        "Get body composition data for a single date or date range",
        get_body_composition,
    );
}

async fn daily(
    ctx: ToolContext,
    p: DateParams,
    operation: fn(String) -> Operation,
    what: &'static str,
) -> ToolResult<Value> {
    let date = resolve_date(p.date.as_deref(), "date")?;
    let value = ctx.gateway.call(operation(date.clone())).await?;
    Ok(or_message(value, || format!("No {what} found for {date}")))
}

async fn range(
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
        format!("No {what} found between {start_date} and {end_date}")
    }))
}

async fn get_body_composition(ctx: ToolContext, p: BodyCompositionParams) -> ToolResult<Value> {
    let start_date = validate_date(&p.start_date, "start_date")?;

    match p.end_date.filter(|e| !e.is_empty()) {
        Some(end_date) => {
            let (start_date, end_date) = validate_date_range(&start_date, &end_date)?;
            let value = ctx
                .gateway
                .call(Operation::BodyComposition {
                    start_date: start_date.clone(),
                    end_date: Some(end_date.clone()),
                })
                .await?;
            Ok(or_message(value, || {
                format!("No body composition data found between {start_date} and {end_date}")
            }))
        }
        None => {
            let value = ctx
                .gateway
                .call(Operation::BodyComposition {
                    start_date: start_date.clone(),
                    end_date: None,
                })
                .await?;
            Ok(or_message(value, || {
                format!("No body composition data found for {start_date}")
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::test_support::{call, registry_with};
    use crate::domains::tools::validation::today;
    use crate::garmin::testing::FakeConnect;
    use serde_json::json;

    #[tokio::test]
    async fn test_daily_tool_defaults_to_today() {
        let fake = FakeConnect::returning(json!({"totalSteps": 8000}));
        let registry = registry_with(fake.clone());

        let out = call(&registry, "get_stats", json!({})).await;
        assert!(out.contains("\"totalSteps\": 8000"));
        assert_eq!(fake.calls(), vec![Operation::Stats { date: today() }]);
    }

    #[tokio::test]
    async fn test_daily_tool_no_data() {
        let registry = registry_with(FakeConnect::returning(json!({})));

        let out = call(&registry, "get_sleep_data", json!({"date": "2024-01-15"})).await;
        assert_eq!(out, "No sleep data found for 2024-01-15");

        let out = call(&registry, "get_spo2_data", json!({"date": "2024-01-15"})).await;
        assert_eq!(out, "No SpO2 data found for 2024-01-15");
    }

    #[tokio::test]
    async fn test_daily_tool_bad_date() {
        let fake = FakeConnect::returning(json!({}));
        let registry = registry_with(fake.clone());

        let out = call(&registry, "get_heart_rates", json!({"date": "15/01/2024"})).await;
        assert_eq!(out, "Error: Invalid date format for date: 15/01/2024. Use YYYY-MM-DD");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_range_tool() {
        let fake = FakeConnect::returning(json!([]));
        let registry = registry_with(fake.clone());

        let out = call(
            &registry,
            "get_body_battery",
            json!({"start_date": "2024-01-01", "end_date": "2024-01-07"}),
        )
        .await;
        assert_eq!(out, "No body battery data found between 2024-01-01 and 2024-01-07");
        assert_eq!(
            fake.calls(),
            vec![Operation::BodyBattery {
                start_date: "2024-01-01".into(),
                end_date: "2024-01-07".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_body_composition_single_day_and_range() {
        let fake = FakeConnect::returning(json!(null));
        let registry = registry_with(fake.clone());

        let out = call(&registry, "get_body_composition", json!({"start_date": "2024-01-01"})).await;
        assert_eq!(out, "No body composition data found for 2024-01-01");

        let out = call(
            &registry,
            "get_body_composition",
            json!({"start_date": "2024-01-01", "end_date": "2024-01-31"}),
        )
        .await;
        assert_eq!(out, "No body composition data found between 2024-01-01 and 2024-01-31");

        assert_eq!(
            fake.calls()[1],
            Operation::BodyComposition {
                start_date: "2024-01-01".into(),
                end_date: Some("2024-01-31".into())
            }
        );
    }
}

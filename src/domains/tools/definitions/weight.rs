//! Weight tools: reading, adding and deleting weigh-ins.

use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{DateParams, DateRangeParams, or_message};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{
    resolve_date, sanitize_string, validate_choice, validate_date, validate_date_range,
    validate_positive_number,
};
use crate::garmin::Operation;

const UNIT_KEYS: &[&str] = &["kg", "lb"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn default_unit_key() -> String {
    "kg".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteWeighInsParams {
    /// Date in YYYY-MM-DD format
    pub date: String,

    /// Whether to delete all measurements for the day
    #[serde(default = "default_true")]
    pub delete_all: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddWeighInParams {
    /// Weight value (must be positive)
    pub weight: f64,

    /// Unit of weight ('kg' or 'lb')
    #[serde(default = "default_unit_key")]
    pub unit_key: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddWeighInWithTimestampsParams {
    /// Weight value (must be positive)
    pub weight: f64,

    /// Unit of weight ('kg' or 'lb')
    #[serde(default = "default_unit_key")]
    pub unit_key: String,

    /// Local timestamp in format YYYY-MM-DDThh:mm:ss (optional)
    #[serde(default)]
    pub date_timestamp: Option<String>,

    /// GMT timestamp in format YYYY-MM-DDThh:mm:ss (optional)
    #[serde(default)]
    pub gmt_timestamp: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add(
            "get_weigh_ins",
            "Get weight measurements between specified dates",
            get_weigh_ins,
        )
        .add(
            "get_daily_weigh_ins",
            "Get weight measurements for a specific date",
            get_daily_weigh_ins,
        )
        .add(
            "delete_weigh_ins",
            "Delete weight measurements for a specific date",
            delete_weigh_ins,
        )
        .add("add_weigh_in", "Add a new weight measurement", add_weigh_in)
        .add(
            "add_weigh_in_with_timestamps",
            "Add a new weight measurement with specific timestamps",
            add_weigh_in_with_timestamps,
        );
}

async fn get_weigh_ins(ctx: ToolContext, p: DateRangeParams) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let weigh_ins = ctx
        .gateway
        .call(Operation::WeighIns {
            start_date: start_date.clone(),
            end_date: end_date.clone(),
        })
        .await?;
    Ok(or_message(weigh_ins, || {
        format!("No weight measurements found between {start_date} and {end_date}.")
    }))
}

async fn get_daily_weigh_ins(ctx: ToolContext, p: DateParams) -> ToolResult<Value> {
    let date = resolve_date(p.date.as_deref(), "date")?;
    let weigh_ins = ctx
        .gateway
        .call(Operation::DailyWeighIns { date: date.clone() })
        .await?;
    Ok(or_message(weigh_ins, || format!("No weight measurements found for {date}.")))
}

async fn delete_weigh_ins(ctx: ToolContext, p: DeleteWeighInsParams) -> ToolResult<Value> {
    let date = validate_date(&p.date, "date")?;
    ctx.gateway
        .call(Operation::DeleteWeighIns {
            date,
            delete_all: p.delete_all,
        })
        .await
}

async fn add_weigh_in(ctx: ToolContext, p: AddWeighInParams) -> ToolResult<Value> {
    let weight = validate_positive_number(p.weight, "weight", false)?;
    let unit_key = validate_choice(&p.unit_key, "unit_key", UNIT_KEYS)?;
    ctx.gateway.call(Operation::AddWeighIn { weight, unit_key }).await
}

async fn add_weigh_in_with_timestamps(
    ctx: ToolContext,
    p: AddWeighInWithTimestampsParams,
) -> ToolResult<Value> {
    let weight = validate_positive_number(p.weight, "weight", false)?;
    let unit_key = validate_choice(&p.unit_key, "unit_key", UNIT_KEYS)?;

    // Both are replaced when either is missing so the pair stays consistent.
    let (date_timestamp, gmt_timestamp) = match (p.date_timestamp, p.gmt_timestamp) {
        (Some(local), Some(gmt)) => (
            sanitize_string(&local, "date_timestamp")?,
            sanitize_string(&gmt, "gmt_timestamp")?,
        ),
        _ => {
            let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
            (now.clone(), now)
        }
    };

    ctx.gateway
        .call(Operation::AddWeighInWithTimestamps {
            weight,
            unit_key,
            date_timestamp,
            gmt_timestamp,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::test_support::{call, registry_with};
    use crate::garmin::testing::FakeConnect;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_weigh_in() {
        let fake = FakeConnect::returning(json!({"status": "ok"}));
        let registry = registry_with(fake.clone());

        let out = call(&registry, "add_weigh_in", json!({"weight": 72.5})).await;
        assert!(out.contains("\"status\": \"ok\""));
        assert_eq!(
            fake.calls(),
            vec![Operation::AddWeighIn { weight: 72.5, unit_key: "kg".into() }]
        );
    }

    #[tokio::test]
    async fn test_add_weigh_in_rejects_bad_input() {
        let fake = FakeConnect::returning(json!(null));
        let registry = registry_with(fake.clone());

        let out = call(&registry, "add_weigh_in", json!({"weight": 0})).await;
        assert_eq!(out, "Error: weight must be greater than 0, got 0");

        let out = call(&registry, "add_weigh_in", json!({"weight": 70, "unit_key": "st"})).await;
        assert_eq!(out, "Error: unit_key must be one of 'kg', 'lb', got 'st'");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_filled_when_missing() {
        let fake = FakeConnect::returning(json!(null));
        let registry = registry_with(fake.clone());

        call(
            &registry,
            "add_weigh_in_with_timestamps",
            json!({"weight": 160, "unit_key": "lb", "date_timestamp": "2024-01-01T08:00:00"}),
        )
        .await;

        match &fake.calls()[0] {
            Operation::AddWeighInWithTimestamps {
                date_timestamp,
                gmt_timestamp,
                ..
            } => {
                assert_eq!(date_timestamp, gmt_timestamp);
                assert_eq!(date_timestamp.len(), 19);
                assert_ne!(date_timestamp, "2024-01-01T08:00:00");
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_weigh_ins_defaults() {
        let fake = FakeConnect::returning(json!(2));
        let registry = registry_with(fake.clone());

        assert_eq!(call(&registry, "delete_weigh_ins", json!({"date": "2024-01-01"})).await, "2");
        assert_eq!(
            fake.calls(),
            vec![Operation::DeleteWeighIns { date: "2024-01-01".into(), delete_all: true }]
        );
    }

    #[tokio::test]
    async fn test_weigh_ins_empty() {
        let registry = registry_with(FakeConnect::returning(json!({"dateWeightList": []})));
        let out = call(
            &registry,
            "get_weigh_ins",
            json!({"start_date": "2024-01-01", "end_date": "2024-01-31"}),
        )
        .await;
        assert!(out.contains("dateWeightList"));
    }
}

//! Parameter types and helpers shared by the tool groups.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::serialization::is_empty_payload;
use crate::garmin::Operation;

/// No arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct EmptyParams {}

/// A single optional day.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DateParams {
    /// Date in YYYY-MM-DD format (default: today)
    #[serde(default)]
    pub date: Option<String>,
}

/// A single required day.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RequiredDateParams {
    /// Date in YYYY-MM-DD format
    pub date: String,
}

/// An inclusive range of days.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DateRangeParams {
    /// Start date in YYYY-MM-DD format
    pub start_date: String,

    /// End date in YYYY-MM-DD format
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ActivityIdParams {
    /// ID of the activity (must be positive integer)
    pub activity_id: i64,
}

/// A tool without arguments: name, description, call, and the reply used
/// when Garmin has nothing.
pub type FixedTool = (&'static str, &'static str, fn() -> Operation, &'static str);

/// Register a batch of argument-less tools.
pub fn register_fixed(registry: &mut ToolRegistry, tools: &[FixedTool]) {
    for &(name, description, operation, missing) in tools {
        registry.add(name, description, move |ctx, _: EmptyParams| {
            fetch_fixed(ctx, operation, missing)
        });
    }
}

async fn fetch_fixed(
    ctx: ToolContext,
    operation: fn() -> Operation,
    missing: &'static str,
) -> ToolResult<Value> {
    let value = ctx.gateway.call(operation()).await?;
    Ok(or_message(value, || missing.to_string()))
}

/// Replace an empty payload with a human readable message.
pub fn or_message<F>(value: Value, message: F) -> Value
where
    F: FnOnce() -> String,
{
    if is_empty_payload(&value) {
        Value::String(message())
    } else {
        value
    }
}

/// Narrow an already validated count to the width Garmin's paging takes.
pub fn to_u32(value: i64, name: &str) -> ToolResult<u32> {
    u32::try_from(value).map_err(|_| {
        ToolError::validation(format!("{name} must be at most {}, got {value}", u32::MAX))
    })
}

/// Render a JSON field the way it should read in a text summary.
pub fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "Unknown".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_or_message() {
        assert_eq!(or_message(json!([]), || "none".into()), json!("none"));
        assert_eq!(or_message(json!(null), || "none".into()), json!("none"));
        assert_eq!(or_message(json!([1]), || "none".into()), json!([1]));
    }

    #[test]
    fn test_to_u32() {
        assert_eq!(to_u32(5, "limit").unwrap(), 5);
        assert!(to_u32(i64::MAX, "limit").is_err());
        assert!(to_u32(-1, "limit").is_err());
    }

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(Some(&json!("Morning Run"))), "Morning Run");
        assert_eq!(field_text(Some(&json!(123))), "123");
        assert_eq!(field_text(Some(&json!(null))), "Unknown");
        assert_eq!(field_text(None), "Unknown");
    }

    #[test]
    fn test_date_params_default() {
        let p: DateParams = serde_json::from_value(json!({})).unwrap();
        assert!(p.date.is_none());
        let p: DateParams = serde_json::from_value(json!({"date": null})).unwrap();
        assert!(p.date.is_none());
    }
}

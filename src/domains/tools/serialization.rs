//! Response serialization.
//!
//! Tool payloads are handed back to the model as text. Strings go through
//! untouched so a handler can return pre-formatted output, everything else
//! becomes indented JSON.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Render a tool payload as the text sent back to the client.
pub fn serialize_response<T>(value: &T) -> String
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(Value::Null) => "null".to_string(),
        Ok(Value::String(s)) => s,
        Ok(other) => match serde_json::to_string_pretty(&other) {
            Ok(s) => s,
            Err(e) => serialization_failure(&e),
        },
        Err(e) => serialization_failure(&e),
    }
}

fn serialization_failure(err: &serde_json::Error) -> String {
    error!("Error serializing response: {}", err);
    format!("Error serializing response: {}", err)
}

/// Whether a payload carries nothing worth showing.
///
/// Garmin answers "no data" with any of `null`, `[]`, `{}`, `""`, `false` or `0`
/// depending on the endpoint.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

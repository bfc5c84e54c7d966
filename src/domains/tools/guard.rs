//! Uniform error handling around tool handlers.
//!
//! A wrapped handler always produces a `String`. Expected failures come back
//! as `Error: <message>` and are logged at warn level. Anything else comes back
//! as `Error in <tool>: <message>` and is logged at error level with its full
//! cause chain.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

use super::error::{ToolError, ToolResult};
use super::serialization::serialize_response;

/// A wrapped tool: raw JSON arguments in, response text out.
pub type ToolHandler = Arc<dyn Fn(JsonObject) -> BoxFuture<'static, String> + Send + Sync>;

/// Await an async handler and turn its result into response text.
pub async fn run<F>(tool: &str, handler: F) -> String
where
    F: Future<Output = ToolResult<Value>>,
{
    finish(tool, handler.await)
}

/// Run a sync handler on the blocking pool and turn its result into response text.
pub async fn run_blocking<F>(tool: &str, handler: F) -> String
where
    F: FnOnce() -> ToolResult<Value> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(handler)
        .await
        .unwrap_or_else(|e| Err(ToolError::Unexpected(anyhow::Error::new(e))));
    finish(tool, result)
}

fn finish(tool: &str, result: ToolResult<Value>) -> String {
    match result {
        Ok(value) => serialize_response(&value),
        Err(e) if e.is_domain() => {
            warn!(tool, kind = e.kind(), "Validation/API error in {}: {}", tool, e);
            format!("Error: {e}")
        }
        Err(e) => {
            error!(tool, "Unexpected error in {}: {:?}", tool, e);
            format!("Error in {tool}: {e}")
        }
    }
}

/// Decode tool arguments into the handler's parameter type.
pub fn decode_params<P: DeserializeOwned>(tool: &str, args: JsonObject) -> ToolResult<P> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::validation(format!("Invalid arguments for {tool}: {e}")))
}

/// Wrap an async handler taking typed parameters.
pub fn with_error_handling<P, F, Fut>(tool: &'static str, handler: F) -> ToolHandler
where
    P: DeserializeOwned + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<Value>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |args: JsonObject| {
        let handler = handler.clone();
        async move {
            run(tool, async move {
                let params = decode_params::<P>(tool, args)?;
                handler(params).await
            })
            .await
        }
        .boxed()
    })
}

/// Wrap a sync handler taking typed parameters. It runs on the blocking pool.
pub fn with_error_handling_blocking<P, F>(tool: &'static str, handler: F) -> ToolHandler
where
    P: DeserializeOwned + Send + 'static,
    F: Fn(P) -> ToolResult<Value> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |args: JsonObject| {
        let handler = handler.clone();
        async move {
            run_blocking(tool, move || {
                let params = decode_params::<P>(tool, args)?;
                handler(params)
            })
            .await
        }
        .boxed()
    })
}

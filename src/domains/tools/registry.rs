//! Tool Registry - central registration and dispatch for all tools.
//!
//! Every transport lists and calls tools through this registry. Tool groups
//! in `definitions/` add their tools with [`ToolRegistry::add`] or
//! [`ToolRegistry::add_blocking`]. Each handler is wrapped with the error
//! handling from [`guard`](super::guard) at registration time, so a call
//! always yields response text.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::definitions;
use super::error::ToolResult;
use super::gateway::Gateway;
use super::guard::{ToolHandler, with_error_handling, with_error_handling_blocking};
use crate::core::config::Config;

/// Shared state every tool handler receives.
#[derive(Clone)]
pub struct ToolContext {
    pub gateway: Gateway,
    pub config: Arc<Config>,
}

struct ToolEntry {
    tool: Tool,
    handler: ToolHandler,
}

/// Tool registry - owns every tool's metadata and wrapped handler.
pub struct ToolRegistry {
    context: ToolContext,
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Registry with every Garmin tool registered.
    pub fn new(config: Arc<Config>, gateway: Gateway) -> Self {
        let mut registry = Self::empty(config, gateway);
        definitions::register_all(&mut registry);
        registry
    }

    /// Registry with no tools.
    pub fn empty(config: Arc<Config>, gateway: Gateway) -> Self {
        Self {
            context: ToolContext { gateway, config },
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register an async tool.
    pub fn add<P, F, Fut>(&mut self, name: &'static str, description: &'static str, handler: F) -> &mut Self
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(ToolContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<Value>> + Send + 'static,
    {
        let context = self.context.clone();
        let wrapped = with_error_handling(name, move |params: P| handler(context.clone(), params));
        self.insert(tool_model::<P>(name, description), wrapped)
    }

    /// Register a tool whose handler does blocking work. It runs on the
    /// blocking pool.
    pub fn add_blocking<P, F>(&mut self, name: &'static str, description: &'static str, handler: F) -> &mut Self
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(ToolContext, P) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let context = self.context.clone();
        let wrapped =
            with_error_handling_blocking(name, move |params: P| handler(context.clone(), params));
        self.insert(tool_model::<P>(name, description), wrapped)
    }

    fn insert(&mut self, tool: Tool, handler: ToolHandler) -> &mut Self {
        let name = tool.name.to_string();
        let entry = ToolEntry { tool, handler };

        match self.index.get(&name) {
            Some(&i) => {
                warn!("Tool registered twice, keeping the last one: {}", name);
                self.entries[i] = entry;
            }
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }
        self
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool.name.as_ref()).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.tool.clone()).collect()
    }

    /// Tool model paired with its handler, for building the rmcp router.
    pub fn routes(&self) -> impl Iterator<Item = (Tool, ToolHandler)> + '_ {
        self.entries.iter().map(|e| (e.tool.clone(), e.handler.clone()))
    }

    pub fn handler(&self, name: &str) -> Option<ToolHandler> {
        self.index.get(name).map(|&i| self.entries[i].handler.clone())
    }

    /// Call a tool by name with raw JSON arguments.
    ///
    /// `Err` is reserved for protocol-level failures (unknown tool, arguments
    /// that are not an object). Tool failures are reported inside the text.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, String> {
        let handler = self.handler(name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            format!("Unknown tool: {}", name)
        })?;

        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => JsonObject::new(),
            other => {
                return Err(format!(
                    "Invalid arguments for {}: expected an object, got {}",
                    name, other
                ));
            }
        };

        Ok(handler(args).await)
    }
}

fn tool_model<P: JsonSchema + 'static>(name: &'static str, description: &'static str) -> Tool {
    Tool {
        name: name.into(),
        description: Some(description.into()),
        input_schema: cached_schema_for_type::<P>(),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garmin::testing::FakeConnect;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back.
        text: String,
    }

    fn test_registry() -> ToolRegistry {
        let gateway = Gateway::from_api(FakeConnect::returning(json!(null)));
        ToolRegistry::new(Arc::new(Config::default()), gateway)
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = test_registry();
        let names = registry.tool_names();

        for expected in [
            "list_activities",
            "get_activity",
            "get_stats",
            "get_full_name",
            "get_devices",
            "get_gear",
            "get_weigh_ins",
            "get_goals",
            "get_hrv_data",
            "get_workouts",
            "upload_activity",
            "add_body_composition",
            "get_pregnancy_summary",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_every_tool_has_object_schema() {
        for tool in test_registry().get_all_tools() {
            assert_eq!(
                tool.input_schema.get("type"),
                Some(&json!("object")),
                "{}",
                tool.name
            );
            assert!(tool.description.is_some());
        }
    }

    #[tokio::test]
    async fn test_registry_call_custom_tool() {
        let gateway = Gateway::from_api(FakeConnect::returning(json!(null)));
        let mut registry = ToolRegistry::empty(Arc::new(Config::default()), gateway);
        registry.add("echo", "Echo text", |_ctx, p: EchoParams| async move {
            Ok(Value::String(p.text))
        });

        let out = registry.call_tool("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(out, "hi");

        let out = registry.call_tool("echo", json!({})).await.unwrap();
        assert!(out.starts_with("Error: Invalid arguments for echo:"), "{out}");
    }

    #[tokio::test]
    async fn test_registry_call_unknown() {
        let registry = test_registry();
        let result = registry.call_tool("unknown", json!({})).await;
        assert_eq!(result.unwrap_err(), "Unknown tool: unknown");
    }

    #[tokio::test]
    async fn test_registry_rejects_non_object_arguments() {
        let registry = test_registry();
        let result = registry.call_tool("get_stats", json!([1])).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let gateway = Gateway::from_api(FakeConnect::returning(json!(null)));
        let mut registry = ToolRegistry::empty(Arc::new(Config::default()), gateway);
        registry
            .add("echo", "first", |_ctx, p: EchoParams| async move { Ok(Value::String(p.text)) })
            .add("echo", "second", |_ctx, p: EchoParams| async move { Ok(Value::String(p.text)) });

        let tools = registry.get_all_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].description.as_deref(), Some("second"));
    }
}

//! MCP Server implementation and lifecycle management.
//!
//! The server only offers tools. The tool catalog lives in the
//! [`ToolRegistry`], which the rmcp router (STDIO and TCP) and the HTTP
//! transport both dispatch through, so both see the same tools.

use rmcp::{
    ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler,
};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use crate::domains::tools::{Gateway, ToolRegistry, build_tool_router};

const INSTRUCTIONS: &str = "Garmin Connect tools. Read activities, health and wellness metrics, \
devices, gear, weight, badges, training and workout data from the configured account, and \
record body composition, blood pressure, hydration and weigh-ins. Dates use YYYY-MM-DD.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool catalog and handlers.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server whose tools reach Garmin Connect through
    /// `gateway`.
    pub fn new(config: Config, gateway: Gateway) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(ToolRegistry::new(config.clone(), gateway));
        info!("Registered {} tools", registry.tool_names().len());

        Self {
            tool_router: build_tool_router::<Self>(&registry),
            config,
            registry,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// `Err` only for unknown tools. Tool failures come back as `Ok` text.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        self.registry.call_tool(name, arguments).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

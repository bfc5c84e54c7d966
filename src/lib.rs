//! Garmin Connect MCP server.
//!
//! Exposes a Garmin Connect account as Model Context Protocol tools:
//! activities, health metrics, devices, gear, weight, training, workouts,
//! badges, women's health and manual data entry.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the lazily created client, upload path
//!   checks, the MCP server and its transports
//! - **domains::tools**: validation, the error-handling guard and every tool
//! - **garmin**: the Connect API client, login flow and token store
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use garmin_mcp_server::core::{Config, LazyClient, McpServer};
//! use garmin_mcp_server::domains::tools::Gateway;
//! use garmin_mcp_server::garmin::session;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let login = config.clone();
//!     let client = LazyClient::new(move || session::connect(&login));
//!     let server = McpServer::new(config, Gateway::new(Arc::new(client)));
//!     // Hand the server to a transport...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;
pub mod garmin;

pub use core::{Config, Error, McpServer, Result};

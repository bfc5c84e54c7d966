//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, server lifecycle management,
//! lazily created shared clients and transport layer abstractions.

pub mod config;
pub mod error;
pub mod lazy;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use lazy::LazyClient;
pub use security::{PathSecurityError, validate_upload_path};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};

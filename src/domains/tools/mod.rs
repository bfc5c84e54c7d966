//! Tools domain module.
//!
//! Every tool follows the same pipeline: decode and validate the arguments,
//! run one or more Garmin Connect calls through the [`Gateway`], then turn
//! the outcome into text for the client.
//!
//! ## Architecture
//!
//! - `definitions/` - tool groups, one file per area of the account
//! - `validation.rs` - argument checks shared by all tools
//! - `gateway.rs` - runs blocking Garmin calls off the async runtime
//! - `guard.rs` - maps results and failures to response text
//! - `serialization.rs` - JSON rendering of results
//! - `registry.rs` - tool catalog and HTTP dispatch
//! - `router.rs` - rmcp ToolRouter built from the registry
//!
//! ## Adding a New Tool
//!
//! 1. Add an [`Operation`](crate::garmin::Operation) variant and its client arm
//! 2. Write a handler in the matching `definitions/` file
//! 3. Add it in that file's `register` function
//!
//! Both transports pick it up from the registry.

pub mod definitions;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod registry;
pub mod router;
pub mod serialization;
pub mod validation;

pub use error::{ToolError, ToolResult};
pub use gateway::Gateway;
pub use registry::{ToolContext, ToolRegistry};
pub use router::build_tool_router;

//! The seam between tool handlers and Garmin Connect.

use serde_json::Value;

use super::error::ConnectResult;
use super::operation::Operation;

/// A logged-in Garmin Connect session.
///
/// Implementations block on network I/O and must only be called from a
/// blocking worker thread.
pub trait ConnectApi: Send + Sync {
    fn call(&self, op: &Operation) -> ConnectResult<Value>;
}

//! Garmin Connect client.
//!
//! - `api` - the [`ConnectApi`] seam tool handlers call through
//! - `operation` - every call the server can make
//! - `client` - blocking HTTP implementation against the Connect API
//! - `session` - session restore and credential login
//! - `sso`, `oauth`, `tokens` - the login flow and persisted tokens
//! - `fit` - FIT encoding for body composition uploads

pub mod api;
pub mod client;
pub mod error;
pub mod fit;
pub mod oauth;
pub mod operation;
pub mod session;
pub mod sso;
pub mod tokens;

pub use api::ConnectApi;
#[cfg(test)]
pub(crate) use api::testing;
pub use client::{Endpoints, GarminConnect};
pub use error::{ConnectError, ConnectResult};
pub use fit::BodyComposition;
pub use operation::Operation;

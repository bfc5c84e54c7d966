//! Garmin Connect client errors.

use thiserror::Error;

/// A specialized Result type for Garmin Connect calls.
pub type ConnectResult<T> = std::result::Result<T, ConnectError>;

#[derive(Debug, Error)]
pub enum ConnectError {
    /// Login failed, credentials are missing, or a stored session was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Garmin asked for a one-time code and none was configured.
    #[error(
        "MFA code required. Set GARMIN_MFA_CODE environment variable. Interactive input is not available in MCP server mode."
    )]
    MfaRequired,

    /// Garmin answered with a non-success status.
    #[error("Garmin Connect returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Stored tokens could not be read, decoded or written.
    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A caller-supplied value cannot be used in a request.
    #[error("{0}")]
    InvalidArgument(String),

    /// A response was well-formed HTTP but not what the endpoint promises.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ConnectError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn token_store(msg: impl Into<String>) -> Self {
        Self::TokenStore(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether the server rejected our credentials for this request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

//! Tool-specific error types.
//!
//! Three kinds are "expected" failures that the user should see as a plain
//! message: bad input, a failed Garmin session, and a request Garmin rejected.
//! Everything else is [`ToolError::Unexpected`] and gets logged with its full
//! cause chain before being reported.

use thiserror::Error;

use crate::garmin::ConnectError;

/// A specialized Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// Credential or session failure while obtaining the Garmin client.
    #[error("{0}")]
    Authentication(String),

    /// Garmin Connect rejected a well-formed request.
    #[error("{0}")]
    Api(String),

    /// Anything else.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ToolError {
    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a new API error.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a new unexpected error from a plain message.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(anyhow::anyhow!(msg.into()))
    }

    /// Whether this is one of the expected, user-presentable kinds.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authentication(_) => "authentication",
            Self::Api(_) => "api",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

impl From<ConnectError> for ToolError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Authentication(_) | ConnectError::MfaRequired => {
                Self::Authentication(err.to_string())
            }
            ConnectError::Api { .. } => Self::Api(err.to_string()),
            ConnectError::InvalidArgument(msg) => Self::Validation(msg),
            other => Self::Unexpected(anyhow::Error::new(other)),
        }
    }
}

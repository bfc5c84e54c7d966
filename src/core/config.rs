//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from environment variables (a
//! `.env` file is honoured through `dotenvy`). Garmin credentials may be
//! given inline or through a file, never both.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TOKEN_DIR: &str = "~/.garminconnect";
const DEFAULT_TOKEN_BASE64: &str = "~/.garminconnect_base64";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Garmin account credentials.
    pub credentials: CredentialsConfig,

    /// Garmin Connect session and client settings.
    pub garmin: GarminConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Garmin account credentials, already resolved from inline or file values.
///
/// Both fields are optional: a stored session can authenticate without them.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CredentialsConfig {
    /// Resolve one credential from an inline value or a file path.
    ///
    /// Supplying both is a configuration error. A file must exist and hold a
    /// non-empty value; trailing whitespace is trimmed.
    pub fn resolve(
        name: &str,
        inline: Option<String>,
        file: Option<String>,
    ) -> Result<Option<String>> {
        let inline = inline.filter(|v| !v.is_empty());
        let file = file.filter(|v| !v.trim().is_empty());

        match (inline, file) {
            (Some(_), Some(_)) => Err(Error::config(format!(
                "Only one of {name} and {name}_FILE may be set"
            ))),
            (Some(value), None) => Ok(Some(value)),
            (None, Some(path)) => {
                let path = expand_tilde(&path);
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    Error::config(format!(
                        "Cannot read {name}_FILE '{}': {e}",
                        path.display()
                    ))
                })?;
                let value = contents.trim_end();
                if value.is_empty() {
                    return Err(Error::config(format!(
                        "{name}_FILE '{}' is empty",
                        path.display()
                    )));
                }
                Ok(Some(value.to_string()))
            }
            (None, None) => Ok(None),
        }
    }

    pub fn has_login(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

/// Garmin Connect session and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarminConfig {
    /// Directory holding `oauth1_token.json` and `oauth2_token.json`.
    pub token_dir: PathBuf,

    /// File holding the base64 token blob.
    pub token_base64: PathBuf,

    /// Garmin domain, `garmin.com` or `garmin.cn`.
    pub domain: String,

    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,

    /// Directory `upload_activity` may read files from.
    /// Uploads are disabled when unset.
    pub upload_root: Option<PathBuf>,
}

impl Default for GarminConfig {
    fn default() -> Self {
        Self {
            token_dir: expand_tilde(DEFAULT_TOKEN_DIR),
            token_base64: expand_tilde(DEFAULT_TOKEN_BASE64),
            domain: "garmin.com".to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            upload_root: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "garmin-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            garmin: GarminConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when a credential is given both inline and as a file, or when a
    /// credential file cannot be used. Missing credentials are not an error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_value("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_value("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env()?;

        config.credentials = CredentialsConfig {
            email: CredentialsConfig::resolve(
                "GARMIN_EMAIL",
                env_value("GARMIN_EMAIL"),
                env_value("GARMIN_EMAIL_FILE"),
            )?,
            password: CredentialsConfig::resolve(
                "GARMIN_PASSWORD",
                env_value("GARMIN_PASSWORD"),
                env_value("GARMIN_PASSWORD_FILE"),
            )?,
        };

        if let Some(dir) = env_value("GARMINTOKENS") {
            config.garmin.token_dir = expand_tilde(&dir);
        }

        if let Some(blob) = env_value("GARMINTOKENS_BASE64") {
            config.garmin.token_base64 = expand_tilde(&blob);
        }

        if let Some(domain) = env_value("GARMIN_DOMAIN") {
            config.garmin.domain = domain;
        }

        if let Some(timeout) = env_value("GARMIN_HTTP_TIMEOUT_SECS") {
            config.garmin.http_timeout_secs = timeout.parse().map_err(|_| {
                Error::config(format!(
                    "GARMIN_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{timeout}'"
                ))
            })?;
        }

        if let Some(root) = env_value("GARMIN_UPLOAD_ROOT") {
            config.garmin.upload_root = Some(expand_tilde(&root));
        }

        Ok(config)
    }

    /// Warnings about a usable but degraded configuration.
    ///
    /// Returned rather than logged because configuration is loaded before
    /// the subscriber exists.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.credentials.has_login() {
            warnings.push(
                "GARMIN_EMAIL/GARMIN_PASSWORD not fully set. \
                 Only a stored session can be used to authenticate."
                    .to_string(),
            );
        }
        warnings
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(Path::new(rest.trim_start_matches('/')))
        }
        _ => PathBuf::from(path),
    }
}

//! Transport configuration types.

use serde::{Deserialize, Serialize};

use super::{TransportError, TransportResult};

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// TCP socket transport with JSON-RPC messages.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// HTTP transport with JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a TCP transport config.
    #[cfg(feature = "tcp")]
    pub fn tcp(port: u16, host: impl Into<String>) -> Self {
        Self::Tcp(TcpConfig {
            port,
            host: host.into(),
        })
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from `MCP_TRANSPORT` and the matching
    /// `MCP_TCP_*` / `MCP_HTTP_*` variables.
    pub fn from_env() -> TransportResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// An unset `MCP_TRANSPORT` picks the default transport. Naming a
    /// transport this build does not include, or a port that does not parse,
    /// is an error.
    pub fn from_lookup<F>(lookup: F) -> TransportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(transport) = lookup("MCP_TRANSPORT") else {
            return Ok(Self::default());
        };

        match transport.trim().to_lowercase().as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => Ok(Self::Stdio),
            #[cfg(feature = "tcp")]
            "tcp" => Ok(Self::Tcp(TcpConfig {
                port: port(&lookup, "MCP_TCP_PORT", 3000)?,
                host: lookup("MCP_TCP_HOST").unwrap_or_else(default_host),
            })),
            #[cfg(feature = "http")]
            "http" => Ok(Self::Http(HttpConfig {
                port: port(&lookup, "MCP_HTTP_PORT", 8080)?,
                host: lookup("MCP_HTTP_HOST").unwrap_or_else(default_host),
                rpc_path: lookup("MCP_HTTP_PATH").unwrap_or_else(default_rpc_path),
                enable_cors: lookup("MCP_HTTP_CORS")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                    .unwrap_or_else(default_cors),
            })),
            other => Err(TransportError::config(format!(
                "MCP_TRANSPORT '{other}' is not available in this build (enabled: {})",
                enabled_transports().join(", ")
            ))),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn port<F>(lookup: &F, key: &str, default: u16) -> TransportResult<u16>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            TransportError::config(format!("{key} must be a port number, got '{raw}'"))
        }),
    }
}

fn enabled_transports() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "stdio")]
    names.push("stdio");
    #[cfg(feature = "tcp")]
    names.push("tcp");
    #[cfg(feature = "http")]
    names.push("http");
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_unset_uses_default() {
        let config = TransportConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TransportConfig::default());
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let err = TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", "carrier-pigeon")]))
            .unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_stdio_case_insensitive() {
        let config = TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", " STDIO ")])).unwrap();
        assert_eq!(config, TransportConfig::Stdio);
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn test_tcp_settings() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("MCP_TRANSPORT", "tcp"),
            ("MCP_TCP_PORT", "4100"),
            ("MCP_TCP_HOST", "0.0.0.0"),
        ]))
        .unwrap();
        assert_eq!(config, TransportConfig::tcp(4100, "0.0.0.0"));
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn test_bad_port_rejected() {
        let err = TransportConfig::from_lookup(lookup(&[
            ("MCP_TRANSPORT", "tcp"),
            ("MCP_TCP_PORT", "70000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MCP_TCP_PORT"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_settings() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_HTTP_PATH", "/rpc"),
            ("MCP_HTTP_CORS", "false"),
        ]))
        .unwrap();
        let TransportConfig::Http(http) = config else {
            panic!("expected http transport");
        };
        assert_eq!(http.port, 8080);
        assert_eq!(http.rpc_path, "/rpc");
        assert!(!http.enable_cors);
    }
}

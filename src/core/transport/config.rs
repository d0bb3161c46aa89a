//! Transport configuration types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "http")]
use crate::core::config::parse_flag;
use crate::core::error::{Error, Result};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON-RPC over standard input/output (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// REST endpoints plus SSE-bound MCP sessions.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

/// Port used when `PORT` is not set.
#[cfg(feature = "http")]
pub const DEFAULT_PORT: u16 = 3000;

#[cfg(feature = "http")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            Self::Http(HttpConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: default_host(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
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

    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects `stdio` or `http`. The HTTP transport reads
    /// `PORT`, `MCP_HTTP_HOST` and `MCP_HTTP_CORS`; a `PORT` that is not a
    /// valid port number is an error.
    pub fn from_env() -> Result<Self> {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" | "sse" => {
                let port = match std::env::var("PORT") {
                    Ok(p) => parse_port(&p)?,
                    Err(_) => DEFAULT_PORT,
                };
                let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
                let enable_cors = std::env::var("MCP_HTTP_CORS")
                    .map(|v| parse_flag(&v, true))
                    .unwrap_or(true);
                Ok(Self::Http(HttpConfig {
                    port,
                    host,
                    enable_cors,
                }))
            }
            #[cfg(feature = "stdio")]
            "" | "stdio" => Ok(Self::Stdio),
            #[cfg(all(not(feature = "stdio"), feature = "http"))]
            "" => Ok(Self::Http(HttpConfig::default())),
            other => Err(Error::config(format!(
                "Unknown transport: {other:?}. Valid: {}",
                Self::available().join(", ")
            ))),
        }
    }

    /// Transport names compiled into this build.
    pub fn available() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "stdio")]
        names.push("stdio");
        #[cfg(feature = "http")]
        names.push("http");
        names
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP/SSE on {}:{}", cfg.host, cfg.port),
        }
    }
}

#[cfg(feature = "http")]
fn parse_port(value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("PORT must be a number between 0 and 65535, got {value:?}")))
}

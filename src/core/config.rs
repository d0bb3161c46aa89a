//! Configuration management for the MCP server.
//!
//! Configuration comes from environment variables (optionally loaded from a
//! `.env` file) layered over defaults. The upstream OData address is a
//! constant and deliberately not configurable.

use super::error::Result;
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
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

/// Name reported by `/health`, the manifests and the MCP handshake.
pub const DEFAULT_SERVER_NAME: &str = "bcb-meios-pagamento-mcp";

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: DEFAULT_SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Recognised variables: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`,
    /// `MCP_LOG_TIMESTAMPS`, plus the transport variables read by
    /// [`TransportConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = parse_flag(&timestamps, true);
        }

        config.transport = TransportConfig::from_env()?;

        Ok(config)
    }
}

/// Parse a boolean-ish environment value; anything unrecognised keeps `default`.
pub(crate) fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

//! MCP server for the Banco Central do Brasil payment-methods open data.
//!
//! Every dataset of the BCB "meios de pagamento" OData service is exposed as
//! an MCP tool taking a reporting period plus optional paging, filtering and
//! sorting options.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the rmcp server handler and
//!   the transports (stdio, HTTP/SSE)
//! - **domains**
//!   - **tools**: the tool catalog, OData query construction, the upstream
//!     fetcher and the dispatcher behind every transport
//!
//! # Example
//!
//! ```rust,no_run
//! use bcb_meios_pagamento_mcp::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = McpServer::new(config.clone());
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};

//! Transport layer for the MCP server.
//!
//! This module provides two transport implementations:
//! - **STDIO**: Line-delimited JSON-RPC over standard input/output (default
//!   for MCP) - feature: `stdio`
//! - **HTTP**: REST tool endpoints plus SSE-bound MCP sessions - feature:
//!   `http`
//!
//! Each transport handles the connection lifecycle and delegates
//! message processing to the MCP server handler.
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio` (default): STDIO transport - minimal dependencies
//! - `http` (default): HTTP transport - adds axum, tower, tower-http, uuid

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod session;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;

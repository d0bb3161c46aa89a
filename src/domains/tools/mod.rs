//! Tools domain module.
//!
//! Everything a tool call needs, independent of the transport that carries
//! it.
//!
//! ## Architecture
//!
//! - `catalog.rs` - the fixed, ordered tool list and each tool's OData endpoint
//! - `params.rs` - argument shapes (schema + decoding) shared by groups of tools
//! - `query.rs` - OData query URL construction
//! - `fetcher.rs` - outbound GET returning JSON
//! - `dispatcher.rs` - name + arguments to a uniform result
//! - `adapter.rs` - the list/call contract both transports are built on
//! - `error.rs` - tool error taxonomy
//!
//! ## Adding a New Tool
//!
//! Add a definition to `catalog.rs`. If none of the existing argument shapes
//! fits, add one to `params.rs`. Transports need no change.

mod adapter;
pub mod catalog;
mod dispatcher;
mod error;
mod fetcher;
pub mod params;
pub mod query;

pub use adapter::{ToolAdapter, ToolCallResult};
pub use catalog::ToolDescriptor;
pub use dispatcher::Dispatcher;
pub use error::{FailureKind, ToolError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use query::{QueryOptions, build_url};

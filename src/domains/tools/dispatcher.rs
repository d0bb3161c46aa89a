//! Tool dispatch: the single place where tool semantics live.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::adapter::{ToolAdapter, ToolCallResult};
use super::catalog;
use super::error::ToolError;
use super::fetcher::{Fetcher, HttpFetcher};
use super::query::build_url;

/// Resolves a tool call into an OData query and runs it.
///
/// Holds no per-call state; the same dispatcher serves every transport and
/// every session concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
}

impl Dispatcher {
    /// Create a dispatcher that fetches through the given [`Fetcher`].
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Create a dispatcher talking to the real service.
    pub fn http() -> Self {
        Self::new(Arc::new(HttpFetcher::new()))
    }

    /// Execute a tool call. Never fails: errors come back as
    /// [`ToolCallResult::Failure`].
    #[instrument(skip(self, arguments))]
    pub async fn execute(&self, name: &str, arguments: Value) -> ToolCallResult {
        let result = self.run(name, arguments).await;
        if let Err(e) = &result {
            warn!("Tool {} failed: {}", name, e);
        }
        result.into()
    }

    /// Build the URL a call would fetch, without fetching it.
    pub fn resolve(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let entry = catalog::lookup(name).ok_or_else(|| ToolError::unknown_tool(name))?;
        let call = entry.shape.decode(name, arguments)?;
        build_url(&entry.endpoint.render(&call.period), &call.options)
    }

    async fn run(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let url = self.resolve(name, arguments)?;
        info!("Querying {}", url);
        self.fetcher.fetch(&url).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolAdapter for Dispatcher {
    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        self.execute(name, arguments).await
    }
}

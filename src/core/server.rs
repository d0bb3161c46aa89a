//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] is the rmcp handler behind every MCP session: the single
//! stdio session and each SSE-bound HTTP session. It answers `tools/list`
//! and `tools/call` from a shared [`ToolAdapter`] and contains no tool logic
//! of its own.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{Dispatcher, ToolAdapter, ToolCallResult};

/// MCP protocol revision advertised by the HTTP manifests.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const INSTRUCTIONS: &str = "Ferramentas de consulta aos dados abertos de meios de pagamento do \
    Banco Central do Brasil. Use ano_mes no formato YYYYMM para dados mensais e trimestre no \
    formato YYYYQ para dados trimestrais.";

/// The main MCP server handler.
///
/// Cheap to clone; clones share configuration and tool adapter.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool listing and execution shared by all transports.
    tools: Arc<dyn ToolAdapter>,
}

impl McpServer {
    /// Create a new MCP server querying the live service.
    pub fn new(config: Config) -> Self {
        Self::with_tools(config, Arc::new(Dispatcher::http()))
    }

    /// Create a server around a specific tool adapter.
    pub fn with_tools(config: Config, tools: Arc<dyn ToolAdapter>) -> Self {
        Self {
            config: Arc::new(config),
            tools,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// The tool adapter, for transports that call it directly.
    pub fn tools(&self) -> &Arc<dyn ToolAdapter> {
        &self.tools
    }
}

/// Render a tool result as an MCP tool result.
///
/// Data becomes one pretty-printed JSON text block; failures become one text
/// block flagged with `isError`.
pub fn to_call_tool_result(name: &str, result: ToolCallResult) -> CallToolResult {
    match result {
        ToolCallResult::Success { data } => {
            CallToolResult::success(vec![Content::text(pretty_json(&data))])
        }
        ToolCallResult::Failure { error, .. } => {
            CallToolResult::error(vec![Content::text(format!("Error executing {name}: {error}"))])
        }
    }
}

/// Pretty-print upstream data for a text content block.
pub fn pretty_json(data: &Value) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        let tools = self
            .tools
            .list_tools()
            .iter()
            .map(|descriptor| descriptor.to_tool())
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let result = self.tools.call_tool(&request.name, arguments).await;
        Ok(to_call_tool_result(&request.name, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::{FailureKind, ToolError};
    use rmcp::model::RawContent;
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[test]
    fn test_success_renders_pretty_json() {
        let result = to_call_tool_result(
            "consultar_terminais_atm",
            ToolCallResult::success(json!({ "value": [1] })),
        );
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text_of(&result), "{\n  \"value\": [\n    1\n  ]\n}");
    }

    #[test]
    fn test_failure_renders_marked_error() {
        let result = to_call_tool_result(
            "nao_existe",
            ToolCallResult::failure(&ToolError::unknown_tool("nao_existe")),
        );
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text_of(&result),
            "Error executing nao_existe: unknown tool: nao_existe"
        );
    }

    #[test]
    fn test_get_info_reports_name_and_tools_capability() {
        let server = McpServer::new(Config::default());
        let info = server.get_info();
        assert_eq!(info.server_info.name, "bcb-meios-pagamento-mcp");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_failure_kind_is_not_rendered() {
        let result = to_call_tool_result(
            "x",
            ToolCallResult::Failure {
                kind: FailureKind::Transport,
                error: "could not reach upstream service: refused".to_string(),
            },
        );
        assert!(!text_of(&result).contains("Transport"));
    }
}

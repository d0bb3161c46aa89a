//! HTTP transport implementation.
//!
//! Two surfaces share one listener:
//!
//! - **REST**: plain JSON endpoints for HTTP tool callers that do not speak
//!   MCP (`/tools`, `/tools/call` and their `/api` aliases, manifests).
//! - **SSE**: `GET /sse` opens an MCP session whose replies stream back as
//!   events; the client posts its messages to the `/message` URL announced
//!   in the first event.
//!
//! Both go through the server's [`ToolAdapter`](crate::domains::tools::ToolAdapter),
//! so they list and call exactly what the stdio transport does.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{any, get, post},
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::session::{DeliveryError, SessionRegistry};
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::server::{PROTOCOL_VERSION, pretty_json};
use crate::domains::tools::{FailureKind, ToolCallResult};

/// Keys accepted for the tool name, in priority order.
const NAME_KEYS: [&str; 2] = ["name", "tool"];

/// Keys accepted for the argument bag, in priority order.
const ARGUMENT_KEYS: [&str; 3] = ["arguments", "args", "parameters"];

const WRONG_CHANNEL: &str = "Use the /sse endpoint for MCP connections";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Open SSE sessions, by id.
    sessions: Arc<SessionRegistry>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → SSE:      GET  /sse");
        info!("  → Messages: POST /message?sessionId=...");
        info!("  → Tools:    GET  /tools, POST /tools/call");
        info!("  → Manifest: GET  /mcp, GET /.well-known/mcp");
        info!("  → Health:   GET  /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the router for every HTTP endpoint.
pub fn router(server: McpServer, enable_cors: bool) -> Router {
    let state = AppState {
        server,
        sessions: Arc::new(SessionRegistry::new()),
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/api/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .route("/api/tools/call", post(call_tool))
        .route("/mcp", get(mcp_manifest))
        .route("/.well-known/mcp", get(discovery_manifest))
        .route("/sse", get(open_sse))
        .route("/message", any(post_message))
        .with_state(state);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "sse": "/sse",
            "message": "/message",
            "tools": "/tools",
            "call": "/tools/call",
            "manifest": "/mcp",
            "discovery": "/.well-known/mcp",
            "health": "/health"
        }
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": state.server.name()
    }))
}

async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.server.tools().list_tools() }))
}

/// Manifest for HTTP tool integrations.
async fn mcp_manifest(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "capabilities": { "tools": {} },
        "tools": state.server.tools().list_tools()
    }))
}

/// Discovery document for MCP clients.
async fn discovery_manifest(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} }
    }))
}

/// A tool call as posted to the REST endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Pick the tool name and argument bag out of a request body.
    ///
    /// For each field the first key holding a non-empty value wins. Returns
    /// `None` when no usable tool name is present; missing arguments become an
    /// empty object.
    pub fn from_body(body: &Value) -> Option<Self> {
        let name = first_present(body, &NAME_KEYS)?.as_str()?.to_string();
        let arguments = first_present(body, &ARGUMENT_KEYS)
            .cloned()
            .unwrap_or_else(|| json!({}));
        Some(Self { name, arguments })
    }
}

fn first_present<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// HTTP status for a failed tool call.
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidRequest => StatusCode::BAD_REQUEST,
        FailureKind::UnknownTool => StatusCode::NOT_FOUND,
        FailureKind::Upstream | FailureKind::Transport => StatusCode::BAD_GATEWAY,
        FailureKind::InvalidEndpoint => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Execute a tool from a REST request.
#[instrument(skip_all, fields(tool))]
async fn call_tool(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return bad_request("Invalid JSON body", format!("Could not parse body: {e}"));
            }
        }
    };

    let Some(request) = ToolCallRequest::from_body(&body) else {
        return bad_request(
            "Missing tool name",
            "Provide the tool name in \"name\" or \"tool\"",
        );
    };

    tracing::Span::current().record("tool", request.name.as_str());
    info!("REST call: {}", request.name);

    match state
        .server
        .tools()
        .call_tool(&request.name, request.arguments)
        .await
    {
        ToolCallResult::Success { data } => Json(json!({
            "success": true,
            "content": [{ "type": "text", "text": pretty_json(&data) }]
        }))
        .into_response(),
        ToolCallResult::Failure { kind, error } => (
            failure_status(kind),
            Json(json!({
                "success": false,
                "content": [{ "type": "text", "text": error }],
                "isError": true
            })),
        )
            .into_response(),
    }
}

fn bad_request(error: &str, message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": error,
            "message": message.into()
        })),
    )
        .into_response()
}

/// Open an SSE-bound MCP session.
async fn open_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.sessions.open(state.server.clone());
    let endpoint = session.endpoint();
    info!("SSE connection opened: {}", session.id());

    let announce = stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) });
    let messages = stream::unfold(session, |mut session| async move {
        let message = session.next_message().await?;
        Some((Ok(Event::default().event("message").data(message)), session))
    });

    Sse::new(announce.chain(messages)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Deliver a client message to its SSE session.
///
/// Anything not addressed to an open session is refused with 405, whatever
/// the method or body. A session whose queue is full answers 503.
async fn post_message(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<MessageQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let session_id = query.ok().and_then(|Query(query)| query.session_id);
    let session_id = match session_id {
        Some(id) if method == Method::POST && state.sessions.contains(&id) => id,
        _ => return wrong_channel(),
    };

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!("Rejected message for session {}: {}", session_id, e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid JSON-RPC message: {e}") })),
            )
                .into_response();
        }
    };

    match state.sessions.deliver(&session_id, message.to_string()) {
        Ok(()) => {
            debug!("Delivered message to session {}", session_id);
            (StatusCode::ACCEPTED, "Accepted").into_response()
        }
        Err(e @ DeliveryError::Busy(_)) => {
            warn!("{}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => {
            warn!("{}", e);
            wrong_channel()
        }
    }
}

fn wrong_channel() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": WRONG_CHANNEL })),
    )
        .into_response()
}

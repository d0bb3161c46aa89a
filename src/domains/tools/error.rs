//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur while resolving and executing a tool call.
///
/// Every variant renders to a non-empty, human-readable message; the
/// dispatcher turns these into [`ToolCallResult::Failure`] values instead of
/// letting them reach a transport.
///
/// [`ToolCallResult::Failure`]: super::ToolCallResult::Failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The requested tool is not in the catalog.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The call arguments do not satisfy the tool's argument shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An endpoint template is not a usable relative path.
    #[error("invalid endpoint template: {0:?}")]
    InvalidEndpoint(String),

    /// The upstream service answered with a failure.
    #[error("upstream service error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// The upstream service could not be reached.
    #[error("could not reach upstream service: {0}")]
    Transport(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "invalid request" error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new "invalid endpoint" error.
    pub fn invalid_endpoint(template: impl Into<String>) -> Self {
        Self::InvalidEndpoint(template.into())
    }

    /// Create a new upstream error.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Upstream {
            status,
            message: if message.trim().is_empty() {
                "empty response body".to_string()
            } else {
                message
            },
        }
    }

    /// Create a new transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// The error category, kept alongside failure results.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownTool(_) => FailureKind::UnknownTool,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::InvalidEndpoint(_) => FailureKind::InvalidEndpoint,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Transport(_) => FailureKind::Transport,
        }
    }
}

/// Category of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnknownTool,
    InvalidRequest,
    InvalidEndpoint,
    Upstream,
    Transport,
}

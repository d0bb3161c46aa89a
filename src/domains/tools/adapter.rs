//! The contract every transport is built on.
//!
//! A transport only ever lists the catalog and forwards a call by name. It
//! never sees endpoint templates or tool-specific arguments; it receives a
//! [`ToolCallResult`] and renders it in its own wire format.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use super::catalog::{self, ToolDescriptor};
use super::error::{FailureKind, ToolError};

/// Uniform outcome of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallResult {
    /// The upstream data, untouched.
    Success { data: Value },

    /// A failed call. `error` is never empty.
    Failure { kind: FailureKind, error: String },
}

impl ToolCallResult {
    /// Create a successful result.
    pub fn success(data: Value) -> Self {
        Self::Success { data }
    }

    /// Create a failed result from a tool error.
    pub fn failure(error: &ToolError) -> Self {
        Self::Failure {
            kind: error.kind(),
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<Result<Value, ToolError>> for ToolCallResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Serialized as `{"success": true, "data": ...}` or
/// `{"success": false, "error": "..."}`.
impl Serialize for ToolCallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolCallResult", 2)?;
        match self {
            Self::Success { data } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure { error, .. } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Operations shared by the line protocol and the HTTP surface.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// The catalog, in order. Descriptors only.
    fn list_tools(&self) -> Vec<ToolDescriptor> {
        catalog::list()
    }

    /// Execute a tool by name with an untyped argument bag.
    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serialization() {
        let result = ToolCallResult::success(json!({ "value": [1, 2] }));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": true, "data": { "value": [1, 2] } })
        );
    }

    #[test]
    fn test_failure_serialization_hides_kind() {
        let result = ToolCallResult::failure(&ToolError::unknown_tool("x"));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": false, "error": "unknown tool: x" })
        );
        assert!(!result.is_success());
    }

    #[test]
    fn test_from_result() {
        let ok: ToolCallResult = Ok(json!(1)).into();
        assert!(ok.is_success());

        let err: ToolCallResult = Err(ToolError::transport("refused")).into();
        assert_eq!(
            err,
            ToolCallResult::Failure {
                kind: FailureKind::Transport,
                error: "could not reach upstream service: refused".to_string(),
            }
        );
    }
}

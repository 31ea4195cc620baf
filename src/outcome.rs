//! Agent invocation outcomes.
//!
//! Every agent call resolves to an [`AgentResult`]: a [`ChatTurn`] on
//! success, or an [`AgentError`] carrying a `(code, message)` failure pair.
//! Cancellation is a separate variant rather than a failure code — it must
//! cross the triage boundary unwrapped, and nothing in this crate is allowed
//! to normalize it into a `Failure`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Well-known failure codes produced by the triage layer.
///
/// Target agents are free to fail with their own codes; these three are the
/// only ones the routing core itself emits.
pub mod codes {
    /// No subject text was found in the request context before classification.
    pub const NO_MESSAGE: &str = "NoMessage";
    /// Routing mapping and fallback chain both failed to produce a target.
    pub const NO_AGENT: &str = "NoAgent";
    /// An unexpected failure inside triage orchestration (classification,
    /// mapping, resolution) — never a target agent's own failure.
    pub const TRIAGE_FAILED: &str = "TriageFailed";
}

/// One completed chat turn — the opaque payload handed back to the transport.
///
/// The transport decides how to render it; this core never inspects `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Reply text.
    pub content: String,
    /// Optional structured payload (widget data, tool output) for the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ChatTurn {
    /// Create a plain-text turn.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            data: None,
        }
    }

    /// Attach a structured payload to the turn.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The error half of an agent outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// The caller's cancellation signal fired. Propagated as-is, never
    /// rewritten into a [`AgentError::Failure`].
    #[error("agent invocation cancelled")]
    Cancelled,

    /// A normal failure outcome carrying a machine-readable code and a
    /// human-readable message.
    #[error("[{code}] {message}")]
    Failure { code: String, message: String },
}

impl AgentError {
    /// Create a failure outcome from a code and message.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The failure code, or `None` for cancellation.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Cancelled => None,
            Self::Failure { code, .. } => Some(code),
        }
    }

    /// Whether this error is a propagated cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// The outcome of one agent invocation.
pub type AgentResult = Result<ChatTurn, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_turn_text() {
        let turn = ChatTurn::text("hello");
        assert_eq!(turn.content, "hello");
        assert!(turn.data.is_none());
    }

    #[test]
    fn test_chat_turn_with_data_serializes_payload() {
        let turn = ChatTurn::text("ok").with_data(json!({"widget": "table"}));
        let encoded = serde_json::to_value(&turn).unwrap();
        assert_eq!(encoded["data"]["widget"], "table");
    }

    #[test]
    fn test_chat_turn_omits_absent_data() {
        let encoded = serde_json::to_value(ChatTurn::text("ok")).unwrap();
        assert!(encoded.get("data").is_none());
    }

    #[test]
    fn test_failure_carries_code_and_message() {
        let err = AgentError::failure(codes::NO_AGENT, "nothing resolvable");
        assert_eq!(err.code(), Some(codes::NO_AGENT));
        assert_eq!(err.to_string(), "[NoAgent] nothing resolvable");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancellation_has_no_code() {
        let err = AgentError::Cancelled;
        assert_eq!(err.code(), None);
        assert!(err.is_cancelled());
    }
}

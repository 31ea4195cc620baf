//! Inter-agent communication context.
//!
//! The well-known keys into the request metadata bag, each with a typed
//! get/set pair. These accessors are the only sanctioned way pipeline
//! stages read and write shared routing state; getters return `None` for a
//! missing or wrong-shaped entry rather than a default.

use serde_json::Value;

use crate::request::{AgentRequest, ContextValue};

/// Well-known metadata keys. Prefer the typed accessors over raw access.
pub mod keys {
    /// Label of the category the triage classifier assigned.
    pub const CLASSIFICATION: &str = "triage.classification";
    /// The user text being classified and routed.
    pub const SUBJECT_TEXT: &str = "triage.subject_text";
    /// Persona the target agent should adopt for this turn.
    pub const PERSONA_OVERRIDE: &str = "agent.persona_override";
    /// Name of the agent the request was dispatched to.
    pub const ROUTED_AGENT: &str = "triage.routed_agent";
    /// Opaque result left behind by a previously invoked agent.
    pub const PREVIOUS_RESULT: &str = "agent.previous_result";
}

/// Record the classification label assigned by the triage classifier.
pub fn set_classification(request: &AgentRequest, label: impl Into<String>) {
    request.set_metadata(keys::CLASSIFICATION, ContextValue::Text(label.into()));
}

/// The classification label, if triage has run.
pub fn classification(request: &AgentRequest) -> Option<String> {
    text(request, keys::CLASSIFICATION)
}

/// Record the subject text for this turn (written by the history provider
/// before triage runs).
pub fn set_subject_text(request: &AgentRequest, subject: impl Into<String>) {
    request.set_metadata(keys::SUBJECT_TEXT, ContextValue::Text(subject.into()));
}

/// The subject text, if present.
pub fn subject_text(request: &AgentRequest) -> Option<String> {
    text(request, keys::SUBJECT_TEXT)
}

/// Ask the target agent to adopt a persona for this turn.
pub fn set_persona_override(request: &AgentRequest, persona: impl Into<String>) {
    request.set_metadata(keys::PERSONA_OVERRIDE, ContextValue::Text(persona.into()));
}

/// The persona override, if any stage requested one.
pub fn persona_override(request: &AgentRequest) -> Option<String> {
    text(request, keys::PERSONA_OVERRIDE)
}

/// Record the name of the agent the request was dispatched to.
pub fn set_routed_agent(request: &AgentRequest, name: impl Into<String>) {
    request.set_metadata(keys::ROUTED_AGENT, ContextValue::Text(name.into()));
}

/// The routed-agent name, if dispatch has happened.
pub fn routed_agent(request: &AgentRequest) -> Option<String> {
    text(request, keys::ROUTED_AGENT)
}

/// Leave an opaque result behind for later stages.
pub fn set_previous_result(request: &AgentRequest, result: Value) {
    request.set_metadata(keys::PREVIOUS_RESULT, ContextValue::Json(result));
}

/// The previous-agent result, if one was recorded.
pub fn previous_result(request: &AgentRequest) -> Option<Value> {
    request
        .metadata(keys::PREVIOUS_RESULT)
        .and_then(|v| v.as_json().cloned())
}

fn text(request: &AgentRequest, key: &str) -> Option<String> {
    request
        .metadata(key)
        .and_then(|v| v.as_text().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn request() -> AgentRequest {
        AgentRequest::new(Arc::new(AgentRegistry::new()))
    }

    #[test]
    fn test_text_accessors_round_trip() {
        let req = request();
        set_classification(&req, "HelpRequest");
        set_subject_text(&req, "I need help");
        set_persona_override(&req, "formal");
        set_routed_agent(&req, "help-agent");

        assert_eq!(classification(&req).as_deref(), Some("HelpRequest"));
        assert_eq!(subject_text(&req).as_deref(), Some("I need help"));
        assert_eq!(persona_override(&req).as_deref(), Some("formal"));
        assert_eq!(routed_agent(&req).as_deref(), Some("help-agent"));
    }

    #[test]
    fn test_missing_keys_read_as_none() {
        let req = request();
        assert!(classification(&req).is_none());
        assert!(subject_text(&req).is_none());
        assert!(persona_override(&req).is_none());
        assert!(routed_agent(&req).is_none());
        assert!(previous_result(&req).is_none());
    }

    #[test]
    fn test_previous_result_round_trip() {
        let req = request();
        set_previous_result(&req, json!({"rows": 3}));
        assert_eq!(previous_result(&req), Some(json!({"rows": 3})));
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let req = request();
        // A JSON value under a text key is absent, not coerced.
        req.set_metadata(keys::SUBJECT_TEXT, ContextValue::Json(json!("sneaky")));
        assert!(subject_text(&req).is_none());

        // And text under the JSON key likewise.
        req.set_metadata(keys::PREVIOUS_RESULT, ContextValue::Text("plain".into()));
        assert!(previous_result(&req).is_none());
    }
}

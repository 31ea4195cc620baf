//! Request envelope and per-request metadata channel.
//!
//! An [`AgentRequest`] represents one inbound chat turn being routed. The
//! envelope itself is immutable; the `metadata` bag is the one mutable
//! channel pipeline stages share, and each request owns its own instance —
//! nothing in it outlives or crosses the routing call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::registry::CapabilityResolver;

/// Identifies one logical resolution scope — typically one inbound request
/// group. The registry's `Scoped` lifetime caches instances per scope id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(Uuid);

impl ScopeId {
    /// Create a fresh scope id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value stored in the per-request metadata bag.
///
/// A closed variant set rather than a fully untyped value: typed accessors
/// (see [`crate::context`]) read an entry of the wrong shape as absent
/// instead of coercing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
    /// Plain text (subject text, labels, agent names).
    Text(String),
    /// Opaque structured data (previous-agent results).
    Json(Value),
}

impl ContextValue {
    /// The text payload, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    /// The structured payload, if this value is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Text(_) => None,
            Self::Json(v) => Some(v),
        }
    }
}

/// One inbound chat turn being routed through the pipeline.
pub struct AgentRequest {
    thread_id: Option<String>,
    scope: ScopeId,
    capabilities: Arc<dyn CapabilityResolver>,
    metadata: Mutex<HashMap<String, ContextValue>>,
}

impl AgentRequest {
    /// Create a request for a new conversation, with a fresh scope and an
    /// empty metadata bag.
    pub fn new(capabilities: Arc<dyn CapabilityResolver>) -> Self {
        Self {
            thread_id: None,
            scope: ScopeId::new(),
            capabilities,
            metadata: Mutex::new(HashMap::new()),
        }
    }

    /// Create a request bound to an existing conversation thread.
    pub fn for_thread(thread_id: impl Into<String>, capabilities: Arc<dyn CapabilityResolver>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::new(capabilities)
        }
    }

    /// Override the resolution scope (e.g. to group several requests into
    /// one logical scope).
    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    /// The conversation thread id; `None` means a new conversation.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// The logical resolution scope of this call.
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// The host-owned capability resolver, borrowed for the call's duration.
    pub fn capabilities(&self) -> &dyn CapabilityResolver {
        self.capabilities.as_ref()
    }

    /// Write a metadata entry, replacing any prior value under `key`.
    pub fn set_metadata(&self, key: impl Into<String>, value: ContextValue) {
        self.metadata.lock().insert(key.into(), value);
    }

    /// Read a metadata entry.
    pub fn metadata(&self, key: &str) -> Option<ContextValue> {
        self.metadata.lock().get(key).cloned()
    }

    /// Keys currently present in the metadata bag, sorted.
    pub fn metadata_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.metadata.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for AgentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRequest")
            .field("thread_id", &self.thread_id)
            .field("scope", &self.scope)
            .field("metadata_keys", &self.metadata_keys())
            .finish()
    }
}

//! # chat-triage
//!
//! Agent pipeline and triage-routing core for AI chat applications.
//!
//! A host transport builds an [`AgentRequest`] per inbound chat turn and
//! hands it either to a middleware pipeline (built with
//! [`PipelineBuilder`]) or to a registered [`TriageAgent`], which
//! classifies the turn and dispatches it to a named handler with
//! deterministic fallback. Widget rendering, conversation persistence, and
//! the actual model invocation live outside this crate behind narrow
//! contracts ([`CapabilityResolver`], [`Classifier`]).
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_triage::{
//!     context, Agent, AgentRegistry, AgentRequest, CapabilityResolver, ChatCategory,
//!     ChatTurn, FunctionAgent, KeywordClassifier, TriageAgent,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = Arc::new(AgentRegistry::new());
//! registry.register_scoped("help-agent", || {
//!     Arc::new(FunctionAgent::from_sync(|_req| Ok(ChatTurn::text("How can I help?"))))
//! })?;
//!
//! let triage = TriageAgent::builder()
//!     .classifier(Arc::new(KeywordClassifier::chat_defaults()))
//!     .mapping(|category: &ChatCategory| match category {
//!         ChatCategory::HelpRequest => Some("help-agent".to_string()),
//!         _ => None,
//!     })
//!     .fallback_name("help-agent")
//!     .build()?;
//!
//! let request = AgentRequest::new(registry as Arc<dyn CapabilityResolver>);
//! context::set_subject_text(&request, "I need help resetting my password");
//! let outcome = triage.invoke(Arc::new(request), CancellationToken::new()).await;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod classify;
pub mod context;
pub mod middleware;
pub mod outcome;
pub mod registry;
pub mod request;
pub mod triage;

pub use agent::{agent_delegate, named_delegate, Agent, AgentDelegate, FunctionAgent};
pub use classify::{ChatCategory, Classifier, KeywordClassifier, TriageCategory};
pub use middleware::{
    AgentMiddleware, MiddlewareFactory, PipelineBuilder, RequestLoggingMiddleware,
};
pub use outcome::{codes, AgentError, AgentResult, ChatTurn};
pub use registry::{
    AgentFactory, AgentLifetime, AgentRegistry, CapabilityResolver, RegistryError,
};
pub use request::{AgentRequest, ContextValue, ScopeId};
pub use triage::{
    RoutingMapping, TriageAgent, TriageAgentBuilder, TriageBuildError, UNNAMED_AGENT,
};

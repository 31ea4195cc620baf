//! Classification-driven request routing.
//!
//! A [`TriageAgent`] is itself an [`Agent`]: it reads the subject text from
//! the request context, classifies it, records the decision back into the
//! context, maps the category to an agent name, resolves the target through
//! the request's capability resolver (with a deterministic fallback chain),
//! and returns the target's outcome unchanged. Single pass, no retries.
//!
//! Failure normalization happens at this boundary: a classifier failure
//! becomes a `TriageFailed` outcome, while a fired cancellation token
//! always propagates as [`AgentError::Cancelled`], never as a failure code.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::classify::{Classifier, TriageCategory};
use crate::context;
use crate::outcome::{codes, AgentError, AgentResult};
use crate::request::AgentRequest;

/// Name recorded as the routed agent when dispatch lands on an anonymous
/// fallback instance.
pub const UNNAMED_AGENT: &str = "unknown";

/// Pure mapping from a category to the name of the agent that should handle
/// it. `None` means "no mapping" and sends the request down the fallback
/// chain.
pub type RoutingMapping<C> = Arc<dyn Fn(&C) -> Option<String> + Send + Sync>;

/// Construction-time misuse of [`TriageAgentBuilder`]; a startup failure,
/// not a routing outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriageBuildError {
    #[error("triage agent requires a classifier")]
    MissingClassifier,
    #[error("triage agent requires a routing mapping")]
    MissingMapping,
}

/// The routing agent. Generic over the caller's closed category set.
pub struct TriageAgent<C: TriageCategory> {
    classifier: Arc<dyn Classifier<C>>,
    mapping: RoutingMapping<C>,
    fallback_name: Option<String>,
    fallback_agent: Option<Arc<dyn Agent>>,
}

impl<C: TriageCategory> TriageAgent<C> {
    /// Start building a triage agent.
    pub fn builder() -> TriageAgentBuilder<C> {
        TriageAgentBuilder::new()
    }

    /// Resolve the dispatch target for `category`.
    ///
    /// A mapped name the resolver does not currently know falls through to
    /// the fallback chain exactly like "no mapping"; only exhausting both
    /// produces `None`. The returned name is what gets recorded as the
    /// routed agent — [`UNNAMED_AGENT`] for an anonymous fallback instance.
    fn resolve_target(
        &self,
        request: &AgentRequest,
        category: &C,
    ) -> Option<(String, Arc<dyn Agent>)> {
        let resolver = request.capabilities();
        let scope = request.scope();

        let candidates = [(self.mapping)(category), self.fallback_name.clone()];
        for name in candidates.into_iter().flatten() {
            if !resolver.has_agent(&name) {
                log::debug!("triage: '{name}' not resolvable, trying fallback");
                continue;
            }
            if let Some(agent) = resolver.resolve_agent(&name, scope) {
                return Some((name, agent));
            }
        }

        self.fallback_agent
            .as_ref()
            .map(|agent| (UNNAMED_AGENT.to_string(), Arc::clone(agent)))
    }
}

#[async_trait]
impl<C: TriageCategory> Agent for TriageAgent<C> {
    async fn invoke(&self, request: Arc<AgentRequest>, cancel: CancellationToken) -> AgentResult {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let subject = match context::subject_text(&request) {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                return Err(AgentError::failure(
                    codes::NO_MESSAGE,
                    "no subject text in request context",
                ))
            }
        };

        let category = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            result = self.classifier.classify(&subject, &cancel) => match result {
                Ok(category) => category,
                Err(err) if cancel.is_cancelled() => {
                    log::debug!("triage: classifier aborted by cancellation: {err:#}");
                    return Err(AgentError::Cancelled);
                }
                Err(err) => {
                    log::warn!("triage: classification failed: {err:#}");
                    return Err(AgentError::failure(
                        codes::TRIAGE_FAILED,
                        format!("classification failed: {err}"),
                    ));
                }
            },
        };

        context::set_classification(&request, category.label());
        context::set_subject_text(&request, subject);

        let (routed_name, target) = match self.resolve_target(&request, &category) {
            Some(hit) => hit,
            None => {
                return Err(AgentError::failure(
                    codes::NO_AGENT,
                    format!(
                        "no resolvable agent for category '{}' and no fallback",
                        category.label()
                    ),
                ))
            }
        };

        context::set_routed_agent(&request, routed_name.clone());
        log::debug!(
            "triage: category '{}' routed to '{}'",
            category.label(),
            routed_name
        );

        // The target's outcome is returned unchanged; its own errors are
        // legitimate results, not triage failures.
        tokio::select! {
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            outcome = target.invoke(Arc::clone(&request), cancel.clone()) => outcome,
        }
    }
}

/// Fluent construction for [`TriageAgent`].
pub struct TriageAgentBuilder<C: TriageCategory> {
    classifier: Option<Arc<dyn Classifier<C>>>,
    mapping: Option<RoutingMapping<C>>,
    fallback_name: Option<String>,
    fallback_agent: Option<Arc<dyn Agent>>,
}

impl<C: TriageCategory> TriageAgentBuilder<C> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            classifier: None,
            mapping: None,
            fallback_name: None,
            fallback_agent: None,
        }
    }

    /// The classifier deciding the category of each turn. Required.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier<C>>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// The pure category → agent-name mapping. Required.
    pub fn mapping<F>(mut self, mapping: F) -> Self
    where
        F: Fn(&C) -> Option<String> + Send + Sync + 'static,
    {
        self.mapping = Some(Arc::new(mapping));
        self
    }

    /// Named fallback, tried when the mapped name is absent or unresolvable.
    pub fn fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }

    /// Last-resort fallback instance, used when no name resolves.
    pub fn fallback_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.fallback_agent = Some(agent);
        self
    }

    /// Build, failing if a required component is missing.
    pub fn build(self) -> Result<TriageAgent<C>, TriageBuildError> {
        Ok(TriageAgent {
            classifier: self.classifier.ok_or(TriageBuildError::MissingClassifier)?,
            mapping: self.mapping.ok_or(TriageBuildError::MissingMapping)?,
            fallback_name: self.fallback_name,
            fallback_agent: self.fallback_agent,
        })
    }
}

impl<C: TriageCategory> Default for TriageAgentBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

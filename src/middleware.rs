//! Middleware contract and pipeline composition.
//!
//! A pipeline wraps a chain of cross-cutting stages around a terminal agent
//! invocation. The builder accumulates middleware *factories* in
//! registration order and folds them right-to-left over the terminal, so
//! the first-registered middleware is outermost: it sees the request first
//! and the outcome last. Instances are constructed fresh per invocation
//! from the request's capability resolver, never shared across requests.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentDelegate;
use crate::outcome::AgentResult;
use crate::registry::CapabilityResolver;
use crate::request::AgentRequest;

/// One cross-cutting pipeline stage.
///
/// Implementations may run logic before calling `next`, after it returns,
/// or both; they may also skip `next` entirely and return their own outcome
/// (short-circuit).
#[async_trait]
pub trait AgentMiddleware: Send + Sync {
    /// Process the request, delegating to the remainder of the chain via `next`.
    async fn invoke(
        &self,
        request: Arc<AgentRequest>,
        next: AgentDelegate,
        cancel: CancellationToken,
    ) -> AgentResult;
}

/// Constructs one middleware instance from the request's capability
/// resolver. Called once per pipeline invocation.
pub type MiddlewareFactory =
    Arc<dyn Fn(&dyn CapabilityResolver) -> Arc<dyn AgentMiddleware> + Send + Sync>;

/// Accumulates middleware factories and composes them into one delegate.
#[derive(Default, Clone)]
pub struct PipelineBuilder {
    factories: Vec<MiddlewareFactory>,
}

impl PipelineBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware factory. Registration order is outermost-first.
    pub fn with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&dyn CapabilityResolver) -> Arc<dyn AgentMiddleware> + Send + Sync + 'static,
    {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Append a pre-built middleware shared across invocations. Only for
    /// stateless stages; anything needing request-scoped services belongs
    /// in [`with`](Self::with).
    pub fn with_shared(self, middleware: Arc<dyn AgentMiddleware>) -> Self {
        self.with(move |_| Arc::clone(&middleware))
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no middleware has been registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Compose the registered chain around `terminal`.
    ///
    /// The fold runs right-to-left: the last-registered middleware wraps the
    /// terminal most tightly. Building does not consume the factory list, so
    /// the same builder can produce delegates for different terminals; each
    /// built delegate is immutable and safe to invoke concurrently.
    pub fn build(&self, terminal: AgentDelegate) -> AgentDelegate {
        let mut chain = terminal;
        for factory in self.factories.iter().rev() {
            let factory = Arc::clone(factory);
            let next = chain;
            chain = Arc::new(move |request: Arc<AgentRequest>, cancel: CancellationToken| {
                let factory = Arc::clone(&factory);
                let next = Arc::clone(&next);
                let fut: BoxFuture<'static, AgentResult> = Box::pin(async move {
                    let middleware = factory(request.capabilities());
                    middleware.invoke(request, next, cancel).await
                });
                fut
            });
        }
        chain
    }
}

/// Logs pipeline entry and outcome around the rest of the chain.
pub struct RequestLoggingMiddleware;

#[async_trait]
impl AgentMiddleware for RequestLoggingMiddleware {
    async fn invoke(
        &self,
        request: Arc<AgentRequest>,
        next: AgentDelegate,
        cancel: CancellationToken,
    ) -> AgentResult {
        log::debug!(
            "pipeline start (thread={:?}, scope={})",
            request.thread_id(),
            request.scope()
        );
        let outcome = next(Arc::clone(&request), cancel).await;
        match &outcome {
            Ok(_) => log::debug!("pipeline ok (scope={})", request.scope()),
            Err(err) => log::warn!("pipeline failed (scope={}): {err}", request.scope()),
        }
        outcome
    }
}

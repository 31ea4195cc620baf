//! The agent contract and its delegate form.
//!
//! An [`Agent`] is the unit of work: given a request, produce a
//! [`ChatTurn`](crate::outcome::ChatTurn) or an error. The
//! [`AgentDelegate`] alias is the same contract as a plain function value,
//! which is what middleware composition folds over — a pipeline terminal
//! like "invoke whatever agent the registry resolves" is just a delegate,
//! not a dedicated type.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::outcome::{codes, AgentError, AgentResult};
use crate::request::AgentRequest;

/// The unit of work that turns a request into an outcome.
///
/// Implementations must honor the cancellation token: once it fires, the
/// call terminates promptly with [`AgentError::Cancelled`] rather than a
/// normal outcome.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Handle one routed chat turn.
    async fn invoke(&self, request: Arc<AgentRequest>, cancel: CancellationToken) -> AgentResult;
}

/// Delegate form of the [`Agent`] contract: a shareable function value with
/// the same signature, used as the pipeline's composition unit.
pub type AgentDelegate = Arc<
    dyn Fn(Arc<AgentRequest>, CancellationToken) -> BoxFuture<'static, AgentResult> + Send + Sync,
>;

/// Wrap an agent instance as a delegate.
pub fn agent_delegate(agent: Arc<dyn Agent>) -> AgentDelegate {
    Arc::new(move |request, cancel| {
        let agent = Arc::clone(&agent);
        let fut: BoxFuture<'static, AgentResult> =
            Box::pin(async move { agent.invoke(request, cancel).await });
        fut
    })
}

/// Terminal delegate that resolves `name` through the request's capability
/// resolver at call time. Resolution happens per invocation, so a host may
/// re-register the name between calls; an unknown name fails with
/// [`codes::NO_AGENT`].
pub fn named_delegate(name: impl Into<String>) -> AgentDelegate {
    let name = name.into();
    Arc::new(move |request, cancel| {
        let name = name.clone();
        let fut: BoxFuture<'static, AgentResult> = Box::pin(async move {
            let resolved = request.capabilities().resolve_agent(&name, request.scope());
            match resolved {
                Some(agent) => agent.invoke(Arc::clone(&request), cancel).await,
                None => Err(AgentError::failure(
                    codes::NO_AGENT,
                    format!("no agent registered under '{name}'"),
                )),
            }
        });
        fut
    })
}

/// Adapter turning a plain async closure into an [`Agent`], for handlers
/// small enough that a named type would be noise.
pub struct FunctionAgent {
    inner: Box<
        dyn Fn(Arc<AgentRequest>, CancellationToken) -> BoxFuture<'static, AgentResult>
            + Send
            + Sync,
    >,
}

impl FunctionAgent {
    /// Wrap a closure returning a boxed future.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Arc<AgentRequest>, CancellationToken) -> BoxFuture<'static, AgentResult>
            + Send
            + Sync
            + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Wrap a synchronous closure; the returned agent completes immediately.
    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(&AgentRequest) -> AgentResult + Send + Sync + 'static,
    {
        Self::new(move |request, _cancel| {
            let outcome = f(&request);
            let fut: BoxFuture<'static, AgentResult> = Box::pin(async move { outcome });
            fut
        })
    }
}

#[async_trait]
impl Agent for FunctionAgent {
    async fn invoke(&self, request: Arc<AgentRequest>, cancel: CancellationToken) -> AgentResult {
        (self.inner)(request, cancel).await
    }
}

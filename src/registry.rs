//! Name-keyed agent registry with instance-lifetime policies.
//!
//! Registration only records `(name, lifetime, factory)` — no instance is
//! constructed until someone resolves the name. Materialization is
//! lifetime-aware: one cached instance per name for `Singleton`, one per
//! `(name, scope)` for `Scoped`, and a fresh instance every resolution for
//! `Transient`. The name table is written during startup configuration and
//! read-only during steady-state routing.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::agent::Agent;
use crate::request::ScopeId;

/// How long a resolved agent instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentLifetime {
    /// One instance for the process lifetime of the registry. The instance
    /// is shared across scopes, so it must tolerate concurrent invocation.
    Singleton,
    /// One instance per logical scope (typically per inbound request group).
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

/// Host-owned capability surface the core uses to materialize named agents.
///
/// [`AgentRegistry`] is the canonical implementation; a host with its own
/// dependency-injection machinery can substitute it behind this trait.
pub trait CapabilityResolver: Send + Sync {
    /// Resolve an agent by name within a scope. Unknown names are a normal
    /// absence, not an error.
    fn resolve_agent(&self, name: &str, scope: &ScopeId) -> Option<Arc<dyn Agent>>;

    /// Whether `name` is currently registered.
    fn has_agent(&self, name: &str) -> bool;

    /// Every name ever registered, independent of materialization.
    fn agent_names(&self) -> BTreeSet<String>;
}

/// Constructs one agent instance. Invoked lazily, per the lifetime policy.
pub type AgentFactory = Arc<dyn Fn() -> Arc<dyn Agent> + Send + Sync>;

/// Registration-time misuse. Distinct from runtime routing failures, which
/// are ordinary [`AgentError`](crate::outcome::AgentError) outcomes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The agent name was empty or whitespace-only.
    #[error("agent name must not be empty or whitespace-only")]
    BlankName,
}

struct RegistryEntry {
    factory: AgentFactory,
    lifetime: AgentLifetime,
}

/// The name → factory table plus its lifetime-aware instance caches.
#[derive(Default)]
pub struct AgentRegistry {
    entries: DashMap<String, RegistryEntry>,
    singletons: DashMap<String, Arc<dyn Agent>>,
    scoped: DashMap<(String, ScopeId), Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named agent. Names are trimmed; a blank name fails before
    /// any other side effect. Re-registering a name replaces the prior
    /// entry (last wins) and drops its cached instances.
    pub fn register<F>(
        &self,
        name: &str,
        lifetime: AgentLifetime,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn Agent> + Send + Sync + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::BlankName);
        }
        self.singletons.remove(name);
        self.scoped.retain(|(n, _), _| n != name);
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                factory: Arc::new(factory),
                lifetime,
            },
        );
        log::debug!("registered agent '{name}' ({lifetime:?})");
        Ok(())
    }

    /// [`register`](Self::register) with the default `Scoped` lifetime.
    pub fn register_scoped<F>(&self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn Agent> + Send + Sync + 'static,
    {
        self.register(name, AgentLifetime::Scoped, factory)
    }

    /// Whether `name` is registered.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Every name ever registered, whether or not an instance exists yet.
    pub fn list_names(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Resolve an agent by name within `scope`, materializing it per its
    /// declared lifetime. Returns `None` for unknown names.
    pub fn resolve(&self, name: &str, scope: &ScopeId) -> Option<Arc<dyn Agent>> {
        let entry = self.entries.get(name)?;
        let agent = match entry.lifetime {
            AgentLifetime::Transient => (entry.factory)(),
            AgentLifetime::Singleton => self
                .singletons
                .entry(name.to_string())
                .or_insert_with(|| (entry.factory)())
                .clone(),
            AgentLifetime::Scoped => self
                .scoped
                .entry((name.to_string(), scope.clone()))
                .or_insert_with(|| (entry.factory)())
                .clone(),
        };
        Some(agent)
    }

    /// Drop cached `Scoped` instances for a completed scope.
    pub fn release_scope(&self, scope: &ScopeId) {
        self.scoped.retain(|(_, s), _| s != scope);
    }
}

impl CapabilityResolver for AgentRegistry {
    fn resolve_agent(&self, name: &str, scope: &ScopeId) -> Option<Arc<dyn Agent>> {
        self.resolve(name, scope)
    }

    fn has_agent(&self, name: &str) -> bool {
        self.has(name)
    }

    fn agent_names(&self) -> BTreeSet<String> {
        self.list_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FunctionAgent;
    use crate::outcome::ChatTurn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn probe_factory() -> (Arc<AtomicUsize>, impl Fn() -> Arc<dyn Agent> + Send + Sync + 'static)
    {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let factory = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(FunctionAgent::from_sync(|_req| Ok(ChatTurn::text("ok")))) as Arc<dyn Agent>
        };
        (constructed, factory)
    }

    #[test]
    fn test_registered_name_is_resolvable() {
        let registry = AgentRegistry::new();
        let (_, factory) = probe_factory();
        registry.register_scoped("helper", factory).unwrap();
        assert!(registry.has("helper"));
        assert!(registry.resolve("helper", &ScopeId::new()).is_some());
    }

    #[test]
    fn test_blank_name_is_rejected_without_side_effects() {
        let registry = AgentRegistry::new();
        let (_, factory) = probe_factory();
        assert_eq!(
            registry.register("   ", AgentLifetime::Scoped, factory),
            Err(RegistryError::BlankName)
        );
        assert!(registry.list_names().is_empty());
    }

    #[test]
    fn test_registration_trims_name() {
        let registry = AgentRegistry::new();
        let (_, factory) = probe_factory();
        registry.register("  helper  ", AgentLifetime::Scoped, factory).unwrap();
        assert!(registry.has("helper"));
    }

    #[test]
    fn test_unknown_name_resolves_to_none() {
        let registry = AgentRegistry::new();
        assert!(registry.resolve("missing", &ScopeId::new()).is_none());
        assert!(!registry.has("missing"));
    }

    #[test]
    fn test_registration_does_not_construct() {
        let registry = AgentRegistry::new();
        let (constructed, factory) = probe_factory();
        registry.register("lazy", AgentLifetime::Singleton, factory).unwrap();
        assert_eq!(constructed.load(Ordering::SeqCst), 0);
        registry.resolve("lazy", &ScopeId::new());
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_singleton_shared_across_scopes() {
        let registry = AgentRegistry::new();
        let (constructed, factory) = probe_factory();
        registry.register("one", AgentLifetime::Singleton, factory).unwrap();
        let a = registry.resolve("one", &ScopeId::new()).unwrap();
        let b = registry.resolve("one", &ScopeId::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_cached_per_scope() {
        let registry = AgentRegistry::new();
        let (constructed, factory) = probe_factory();
        registry.register("per-scope", AgentLifetime::Scoped, factory).unwrap();

        let scope_a = ScopeId::new();
        let scope_b = ScopeId::new();
        let first = registry.resolve("per-scope", &scope_a).unwrap();
        let again = registry.resolve("per-scope", &scope_a).unwrap();
        let other = registry.resolve("per-scope", &scope_b).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(constructed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transient_always_fresh() {
        let registry = AgentRegistry::new();
        let (constructed, factory) = probe_factory();
        registry.register("fresh", AgentLifetime::Transient, factory).unwrap();

        let scope = ScopeId::new();
        let a = registry.resolve("fresh", &scope).unwrap();
        let b = registry.resolve("fresh", &scope).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(constructed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_list_names_independent_of_materialization() {
        let registry = AgentRegistry::new();
        let (_, f1) = probe_factory();
        let (_, f2) = probe_factory();
        registry.register("a", AgentLifetime::Singleton, f1).unwrap();
        registry.register("b", AgentLifetime::Transient, f2).unwrap();
        let names: Vec<_> = registry.list_names().into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_reregistration_replaces_and_invalidates_cache() {
        let registry = AgentRegistry::new();
        let (first_count, first) = probe_factory();
        registry.register("svc", AgentLifetime::Singleton, first).unwrap();
        let scope = ScopeId::new();
        let old = registry.resolve("svc", &scope).unwrap();

        let (second_count, second) = probe_factory();
        registry.register("svc", AgentLifetime::Singleton, second).unwrap();
        let new = registry.resolve("svc", &scope).unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.list_names().len(), 1);
    }

    #[test]
    fn test_release_scope_drops_scoped_cache() {
        let registry = AgentRegistry::new();
        let (constructed, factory) = probe_factory();
        registry.register("per-scope", AgentLifetime::Scoped, factory).unwrap();

        let scope = ScopeId::new();
        registry.resolve("per-scope", &scope);
        registry.release_scope(&scope);
        registry.resolve("per-scope", &scope);
        assert_eq!(constructed.load(Ordering::SeqCst), 2);
    }
}

//! Accessors: one resolution strategy each.
//!
//! An accessor owns a set of keys (or a custom matcher), one creation
//! function in both calling conventions, and a [`Lifetime`]:
//!
//! ```text
//! TransientAccessor   resolve ──> create ──> new instance
//! SingletonAccessor   resolve ──> cached? ──yes──> same instance
//!                                   │no
//!                             gate (sync | async)
//!                                   │
//!                             cached? ──yes──> same instance
//!                                   │no
//!                             create ──> cache ──> same instance
//! ```

use std::any::type_name;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{Instrument, debug, debug_span, trace, warn};
use wakil_support::rendering::{render_keys, shorten_type_name};

use crate::args::Args;
use crate::bridge::{Origin, Resolvers};
use crate::error::{ConfigurationError, MissingPart, Result, WakilError};
use crate::gate::{CreationGate, GateGuard};
use crate::lifetime::Lifetime;
use crate::matcher::KeyMatcher;
use crate::options::FailurePolicy;

/// Resolves services of type `S` for keys of type `K`.
///
/// Implemented by [`TransientAccessor`] and [`SingletonAccessor`]; custom
/// implementations can be registered with
/// [`FactoryBuilder::accessor_instance`](crate::factory::FactoryBuilder::accessor_instance).
#[async_trait]
pub trait ServiceAccessor<K, S>: Send + Sync {
    /// Whether this accessor owns `key`.
    fn can_resolve(&self, key: &K) -> bool;

    /// Resolves the service, blocking the caller.
    fn resolve(&self, args: Args) -> Result<S>;

    /// Resolves the service asynchronously.
    async fn resolve_async(&self, args: Args) -> Result<S>;

    fn lifetime(&self) -> Lifetime;

    /// Optional human-readable name, used in logs.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Rendered keys, used for "did you mean" suggestions.
    fn rendered_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// State shared by both accessor kinds.
pub(crate) struct AccessorCore<K, S> {
    pub keys: Vec<K>,
    pub matcher: KeyMatcher<K>,
    pub resolvers: Resolvers<S>,
    pub name: Option<String>,
}

impl<K: fmt::Debug + 'static, S> AccessorCore<K, S> {
    /// Rejects an accessor that could never match: no keys and a
    /// key-based matcher.
    fn checked(keys: Vec<K>, matcher: KeyMatcher<K>, resolvers: Resolvers<S>) -> Result<Self> {
        if keys.is_empty() && !matcher.is_custom() {
            return Err(WakilError::Configuration(ConfigurationError {
                service: type_name::<S>(),
                accessor: None,
                missing: MissingPart::Keys,
            }));
        }
        Ok(Self {
            keys,
            matcher,
            resolvers,
            name: None,
        })
    }

    fn can_resolve(&self, key: &K) -> bool {
        let hit = self.matcher.matches(key, &self.keys);
        trace!(key = ?key, hit, accessor = self.name.as_deref(), "Matching key");
        hit
    }

    fn rendered_keys(&self) -> Vec<String> {
        self.keys.iter().map(|k| format!("{k:?}")).collect()
    }

    fn debug_fields(&self, d: &mut fmt::DebugStruct<'_, '_>) {
        let keys = render_keys(&self.keys);
        d.field("service", &shorten_type_name(type_name::<S>()))
            .field("name", &self.name)
            .field("keys", &format_args!("{keys}"))
            .field("matcher", &self.matcher)
            .field("origin", &self.resolvers.origin());
    }
}

// ═══════════════════════════════════════════
// Transient
// ═══════════════════════════════════════════

/// Creates a new service on every call. Holds no mutable state.
pub struct TransientAccessor<K, S> {
    core: AccessorCore<K, S>,
}

impl<K, S> TransientAccessor<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Send + 'static,
{
    /// # Errors
    /// [`WakilError::Configuration`] when `keys` is empty and `matcher` is
    /// key-based.
    pub fn new(keys: Vec<K>, matcher: KeyMatcher<K>, resolvers: Resolvers<S>) -> Result<Self> {
        Ok(Self::from_core(AccessorCore::checked(keys, matcher, resolvers)?))
    }

    pub(crate) fn from_core(core: AccessorCore<K, S>) -> Self {
        debug!(
            service = type_name::<S>(),
            keys = %render_keys(&core.keys),
            origin = ?core.resolvers.origin(),
            "Built transient accessor"
        );
        Self { core }
    }

    pub fn keys(&self) -> &[K] {
        &self.core.keys
    }

    pub fn origin(&self) -> Origin {
        self.core.resolvers.origin()
    }
}

#[async_trait]
impl<K, S> ServiceAccessor<K, S> for TransientAccessor<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Send + 'static,
{
    fn can_resolve(&self, key: &K) -> bool {
        self.core.can_resolve(key)
    }

    fn resolve(&self, args: Args) -> Result<S> {
        trace!(service = type_name::<S>(), "Resolving transient");
        self.core.resolvers.create(args)
    }

    async fn resolve_async(&self, args: Args) -> Result<S> {
        trace!(service = type_name::<S>(), "Resolving transient (async)");
        self.core.resolvers.create_async(args).await
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Transient
    }

    fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    fn rendered_keys(&self) -> Vec<String> {
        self.core.rendered_keys()
    }
}

impl<K: fmt::Debug + 'static, S> fmt::Debug for TransientAccessor<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TransientAccessor");
        self.core.debug_fields(&mut d);
        d.finish()
    }
}

// ═══════════════════════════════════════════
// Singleton
// ═══════════════════════════════════════════

/// Creates its service once and hands out that same service forever.
///
/// `S` is cloned out of the cache on every resolve; use `Arc<T>` so all
/// callers share one instance.
///
/// A blocking [`resolve`](ServiceAccessor::resolve) made on a tokio worker
/// waits inside `block_in_place`, so the async caller it waits for keeps
/// running. On a current-thread runtime there is no other worker: if
/// another caller is creating the service, the blocking call fails with
/// [`WakilError::Bridge`] instead of stalling the scheduler.
///
/// A creation run belongs to the caller that started it. If that caller
/// is an async one and its future is dropped mid-creation, the run is
/// abandoned without storing anything; the next caller starts a new run.
pub struct SingletonAccessor<K, S> {
    core: AccessorCore<K, S>,
    /// Filled once; holds a failure only under [`FailurePolicy::Cache`].
    cell: OnceCell<Result<S>>,
    gate: CreationGate,
    failure_policy: FailurePolicy,
    wait_timeout: Option<Duration>,
}

impl<K, S> SingletonAccessor<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    /// # Errors
    /// [`WakilError::Configuration`] when `keys` is empty and `matcher` is
    /// key-based.
    pub fn new(keys: Vec<K>, matcher: KeyMatcher<K>, resolvers: Resolvers<S>) -> Result<Self> {
        Ok(Self::from_core(
            AccessorCore::checked(keys, matcher, resolvers)?,
            FailurePolicy::default(),
            None,
        ))
    }

    pub(crate) fn from_core(
        core: AccessorCore<K, S>,
        failure_policy: FailurePolicy,
        wait_timeout: Option<Duration>,
    ) -> Self {
        debug!(
            service = type_name::<S>(),
            keys = %render_keys(&core.keys),
            origin = ?core.resolvers.origin(),
            ?failure_policy,
            "Built singleton accessor"
        );
        Self {
            core,
            cell: OnceCell::new(),
            gate: CreationGate::new(),
            failure_policy,
            wait_timeout,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn keys(&self) -> &[K] {
        &self.core.keys
    }

    pub fn origin(&self) -> Origin {
        self.core.resolvers.origin()
    }

    /// Whether the service (or, under [`FailurePolicy::Cache`], a failure)
    /// has been stored.
    pub fn is_created(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Lock-free read of the cache.
    #[inline]
    fn cached(&self) -> Option<Result<S>> {
        self.cell.get().cloned()
    }

    /// Stores the outcome of the one creation run. Only the gate holder
    /// gets here, so `set` cannot race.
    fn store(&self, result: Result<S>) -> Result<S> {
        match result {
            Ok(service) => {
                let _ = self.cell.set(Ok(service.clone()));
                debug!(service = type_name::<S>(), accessor = self.core.name.as_deref(), "Singleton created");
                Ok(service)
            }
            Err(err) => {
                warn!(
                    service = type_name::<S>(),
                    accessor = self.core.name.as_deref(),
                    error = %err,
                    policy = ?self.failure_policy,
                    "Singleton creation failed"
                );
                if self.failure_policy == FailurePolicy::Cache {
                    let _ = self.cell.set(Err(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Second cache check and creation, with the gate held.
    fn create_locked(&self, _guard: GateGuard<'_>, args: Args) -> Result<S> {
        if let Some(cached) = self.cached() {
            trace!(service = type_name::<S>(), "Singleton created while waiting");
            return cached;
        }

        let result = debug_span!("singleton_create", service = type_name::<S>())
            .in_scope(|| self.core.resolvers.create(args));
        self.store(result)
    }

    fn resolve_blocking(&self, args: Args) -> Result<S> {
        let guard = self
            .gate
            .lock_blocking(self.wait_timeout)
            .map_err(|_| self.timeout_error())?;
        self.create_locked(guard, args)
    }

    /// Blocking resolve on a current-thread scheduler: waiting would
    /// starve whoever holds the gate.
    fn resolve_on_scheduler(&self, args: Args) -> Result<S> {
        match self.gate.try_lock() {
            Some(guard) => self.create_locked(guard, args),
            None => {
                warn!(service = type_name::<S>(), "Blocking resolve would stall a current-thread runtime");
                Err(WakilError::Bridge {
                    service: type_name::<S>(),
                    reason: "another caller is creating the service and waiting would block this \
                             current-thread runtime; use resolve_async"
                        .into(),
                })
            }
        }
    }

    fn timeout_error(&self) -> WakilError {
        let waited_ms = self
            .wait_timeout
            .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        warn!(service = type_name::<S>(), waited_ms, "Gave up waiting for singleton creation");
        WakilError::WaitTimeout {
            service: type_name::<S>(),
            waited_ms,
        }
    }
}

#[async_trait]
impl<K, S> ServiceAccessor<K, S> for SingletonAccessor<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn can_resolve(&self, key: &K) -> bool {
        self.core.can_resolve(key)
    }

    fn resolve(&self, args: Args) -> Result<S> {
        if let Some(cached) = self.cached() {
            trace!(service = type_name::<S>(), "Singleton cache hit");
            return cached;
        }

        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Err(_) => self.resolve_blocking(args),
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| self.resolve_blocking(args)),
            Ok(_) => self.resolve_on_scheduler(args),
        }
    }

    async fn resolve_async(&self, args: Args) -> Result<S> {
        if let Some(cached) = self.cached() {
            trace!(service = type_name::<S>(), "Singleton cache hit");
            return cached;
        }

        let _guard = self
            .gate
            .lock_async(self.wait_timeout)
            .await
            .map_err(|_| self.timeout_error())?;

        if let Some(cached) = self.cached() {
            trace!(service = type_name::<S>(), "Singleton created while waiting");
            return cached;
        }

        let result = self
            .core
            .resolvers
            .create_async(args)
            .instrument(debug_span!("singleton_create", service = type_name::<S>(), mode = "async"))
            .await;
        self.store(result)
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Singleton
    }

    fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    fn rendered_keys(&self) -> Vec<String> {
        self.core.rendered_keys()
    }
}

impl<K: fmt::Debug + 'static, S> fmt::Debug for SingletonAccessor<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("SingletonAccessor");
        self.core.debug_fields(&mut d);
        d.field("created", &self.cell.get().is_some())
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

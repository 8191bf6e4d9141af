//! # The Factory — key-based dispatch over accessors
//!
//! A [`Factory`] holds the accessors for one (service, key) pair and picks
//! between them by key.
//!
//! # Architecture
//! ```text
//! FactoryBuilder  ──build()──>  Factory
//!                                  │
//!                           get_accessor(key)      first match, by priority
//!                                  │               then registration order
//!                                  ▼
//!                           ServiceAccessor ──resolve / resolve_async──> S
//! ```
//!
//! # Examples
//! ```rust
//! use wakil_factory::prelude::*;
//! use std::sync::Arc;
//!
//! trait Exporter: Send + Sync {
//!     fn export(&self) -> String;
//! }
//!
//! struct Pdf;
//! impl Exporter for Pdf {
//!     fn export(&self) -> String { "pdf".into() }
//! }
//!
//! struct Csv;
//! impl Exporter for Csv {
//!     fn export(&self) -> String { "csv".into() }
//! }
//!
//! let factory = Factory::<&str, Arc<dyn Exporter>>::builder()
//!     .singleton(["pdf"], |_| Ok(Arc::new(Pdf) as Arc<dyn Exporter>))
//!     .transient(["csv", "tsv"], |_| Ok(Arc::new(Csv) as Arc<dyn Exporter>))
//!     .build()
//!     .expect("Failed to build factory");
//!
//! assert!(factory.can_resolve(&"tsv"));
//! let exporter = factory.resolve(&"pdf", Args::empty()).expect("Failed to resolve");
//! assert_eq!(exporter.export(), "pdf");
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, instrument, trace};
use wakil_support::rendering::{shorten_type_name, suggest_similar};

use crate::accessor::ServiceAccessor;
use crate::args::Args;
use crate::descriptor::AccessorDescriptor;
use crate::error::{ConfigurationError, MissingPart, NoMatchError, Result, WakilError};
use crate::lifetime::Lifetime;
use crate::matcher::KeyMatcher;
use crate::options::FactoryOptions;
use crate::provider::{AccessorProvider, AccessorRegistry};

const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// FactoryBuilder
// ============================================================

enum Pending<K, S> {
    Descriptor(AccessorDescriptor<K, S>),
    Built {
        accessor: Arc<dyn ServiceAccessor<K, S>>,
        priority: i32,
    },
}

impl<K, S> Pending<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn priority(&self) -> i32 {
        match self {
            Pending::Descriptor(d) => d.get_priority(),
            Pending::Built { priority, .. } => *priority,
        }
    }
}

/// Builds a [`Factory`] from accessor descriptors.
///
/// Register every accessor first, then call
/// [`build()`](FactoryBuilder::build) to get an immutable, thread-safe
/// factory. Descriptors that leave their lifetime or matcher unset pick up
/// the builder defaults.
///
/// # Examples
/// ```rust,ignore
/// let factory = Factory::builder()
///     .options(FactoryOptions::default().with_wait_timeout(Duration::from_secs(5)))
///     .default_lifetime(Lifetime::Singleton)
///     .accessor(AccessorDescriptor::new().key(Feature::Search).sync_create(|_| ...))
///     .accessor(AccessorDescriptor::new().key(Feature::Billing).async_create(|_| async { ... }))
///     .build()?;
/// ```
pub struct FactoryBuilder<K, S> {
    pending: Vec<Pending<K, S>>,
    options: FactoryOptions,
    default_lifetime: Option<Lifetime>,
    default_matcher: Option<KeyMatcher<K>>,
}

impl<K, S> FactoryBuilder<K, S>
where
    K: PartialEq + fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            options: FactoryOptions::default(),
            default_lifetime: None,
            default_matcher: None,
        }
    }

    pub fn options(mut self, options: FactoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Lifetime for descriptors that don't set one.
    pub fn default_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.default_lifetime = Some(lifetime);
        self
    }

    /// Matcher for descriptors that don't set one.
    pub fn default_matcher(mut self, matcher: KeyMatcher<K>) -> Self {
        self.default_matcher = Some(matcher);
        self
    }

    /// Register an accessor descriptor.
    pub fn accessor(mut self, descriptor: AccessorDescriptor<K, S>) -> Self {
        self.pending.push(Pending::Descriptor(descriptor));
        self
    }

    /// Register an already built accessor, e.g. a custom
    /// [`ServiceAccessor`] implementation.
    pub fn accessor_instance(mut self, accessor: Arc<dyn ServiceAccessor<K, S>>, priority: i32) -> Self {
        self.pending.push(Pending::Built { accessor, priority });
        self
    }

    // ── Shorthands ──

    /// Register a singleton accessor with a sync creation function.
    ///
    /// Called ONCE, on the first resolve through either calling convention.
    /// **`S` is cloned on each resolve**; use `Arc<T>` for services.
    pub fn singleton(
        self,
        keys: impl IntoIterator<Item = K>,
        create: impl Fn(Args) -> Result<S> + Send + Sync + 'static,
    ) -> Self {
        self.accessor(AccessorDescriptor::new().keys(keys).singleton().sync_create(create))
    }

    /// Register a transient accessor with a sync creation function.
    ///
    /// Called on EVERY resolve.
    pub fn transient(
        self,
        keys: impl IntoIterator<Item = K>,
        create: impl Fn(Args) -> Result<S> + Send + Sync + 'static,
    ) -> Self {
        self.accessor(AccessorDescriptor::new().keys(keys).transient().sync_create(create))
    }

    // ── Provider modules ──

    /// Add an [`AccessorProvider`] module.
    pub fn add_provider(mut self, provider: &dyn AccessorProvider<K, S>) -> Self {
        debug!(provider = provider.name(), "Adding accessor provider");
        provider.register(&mut self);
        self
    }

    // ── Build ──

    /// Build the factory, validating every descriptor.
    ///
    /// # Errors
    /// The first [`WakilError::Configuration`] found, in registration order.
    #[instrument(skip(self), name = "factory_build", fields(service = type_name::<S>()))]
    pub fn build(self) -> Result<Factory<K, S>> {
        info!(registered = self.pending.len(), "Building factory");

        if self.pending.is_empty() && !self.options.allow_empty {
            return Err(WakilError::Configuration(ConfigurationError {
                service: type_name::<S>(),
                accessor: None,
                missing: MissingPart::Accessors,
            }));
        }

        let mut ranked: Vec<(i32, Arc<dyn ServiceAccessor<K, S>>)> = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            let priority = pending.priority();
            let accessor = match pending {
                Pending::Built { accessor, .. } => accessor,
                Pending::Descriptor(mut descriptor) => {
                    if descriptor.lifetime.is_none() {
                        descriptor.lifetime = self.default_lifetime;
                    }
                    if descriptor.matcher.is_none() {
                        descriptor.matcher = self.default_matcher.clone();
                    }
                    descriptor.build(&self.options)?
                }
            };
            ranked.push((priority, accessor));
        }

        // Stable: equal priorities stay in registration order
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let factory = Factory::from_accessors(ranked.into_iter().map(|(_, a)| a).collect());
        info!(accessors = factory.len(), "Factory built successfully ✓");
        Ok(factory)
    }
}

impl<K, S> AccessorRegistry<K, S> for FactoryBuilder<K, S>
where
    K: PartialEq + fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn register_descriptor(&mut self, descriptor: AccessorDescriptor<K, S>) {
        self.pending.push(Pending::Descriptor(descriptor));
    }

    fn register_accessor(&mut self, accessor: Arc<dyn ServiceAccessor<K, S>>, priority: i32) {
        self.pending.push(Pending::Built { accessor, priority });
    }
}

// ═══════════════════════════════════════════
// Factory
// ═══════════════════════════════════════════

/// Immutable, thread-safe collection of accessors for one
/// (service, key) pair.
///
/// Created by [`FactoryBuilder::build()`] or [`Factory::from_accessors`].
pub struct Factory<K, S> {
    accessors: Vec<Arc<dyn ServiceAccessor<K, S>>>,
}

impl<K, S> Factory<K, S>
where
    K: PartialEq + fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    /// Create a new builder.
    pub fn builder() -> FactoryBuilder<K, S> {
        FactoryBuilder::new()
    }
}

impl<K, S> Factory<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Send + 'static,
{
    /// Wraps accessors as they are; the order given is the match order.
    pub fn from_accessors(accessors: Vec<Arc<dyn ServiceAccessor<K, S>>>) -> Self {
        debug!(service = type_name::<S>(), accessors = accessors.len(), "Factory assembled");
        Self { accessors }
    }

    /// Whether any accessor owns `key`.
    pub fn can_resolve(&self, key: &K) -> bool {
        self.accessors.iter().any(|a| a.can_resolve(key))
    }

    /// The first accessor that owns `key`.
    ///
    /// # Errors
    /// [`WakilError::NoMatch`] naming the key when no accessor owns it.
    pub fn get_accessor(&self, key: &K) -> Result<Arc<dyn ServiceAccessor<K, S>>> {
        trace!(key = ?key, "Looking up accessor");
        self.accessors
            .iter()
            .find(|a| a.can_resolve(key))
            .cloned()
            .ok_or_else(|| self.no_match(key))
    }

    /// Every accessor that owns `key`, in match order. May be empty.
    pub fn get_accessors(&self, key: &K) -> Vec<Arc<dyn ServiceAccessor<K, S>>> {
        self.accessors
            .iter()
            .filter(|a| a.can_resolve(key))
            .cloned()
            .collect()
    }

    /// Resolve through the first matching accessor, blocking.
    pub fn resolve(&self, key: &K, args: Args) -> Result<S> {
        self.get_accessor(key)?.resolve(args)
    }

    /// Resolve through the first matching accessor.
    pub async fn resolve_async(&self, key: &K, args: Args) -> Result<S> {
        let accessor = self.get_accessor(key)?;
        accessor.resolve_async(args).await
    }

    /// Resolve through every matching accessor, in match order.
    ///
    /// Stops at the first failure. An unknown key yields an empty list.
    pub fn resolve_all(&self, key: &K, args: Args) -> Result<Vec<S>> {
        self.get_accessors(key)
            .iter()
            .map(|a| a.resolve(args.clone()))
            .collect()
    }

    /// Resolve through every matching accessor concurrently.
    ///
    /// Results keep match order; the first failure wins.
    pub async fn resolve_all_async(&self, key: &K, args: Args) -> Result<Vec<S>> {
        let accessors = self.get_accessors(key);
        try_join_all(accessors.iter().map(|a| a.resolve_async(args.clone()))).await
    }

    /// Number of accessors.
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// All accessors in match order.
    pub fn accessors(&self) -> &[Arc<dyn ServiceAccessor<K, S>>] {
        &self.accessors
    }

    fn no_match(&self, key: &K) -> WakilError {
        let requested = format!("{key:?}");
        let registered: Vec<String> = self
            .accessors
            .iter()
            .flat_map(|a| a.rendered_keys())
            .collect();

        debug!(key = %requested, "No accessor for key");
        WakilError::NoMatch(NoMatchError {
            suggestions: suggest_similar(&requested, &registered, MAX_SUGGESTIONS),
            key: requested,
            service: type_name::<S>(),
        })
    }
}

impl<K, S> Clone for Factory<K, S> {
    fn clone(&self) -> Self {
        Self {
            accessors: self.accessors.clone(),
        }
    }
}

impl<K, S> fmt::Debug for Factory<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("service", &shorten_type_name(type_name::<S>()))
            .field("key", &shorten_type_name(type_name::<K>()))
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Factory, FactoryBuilder};
    pub use crate::accessor::{ServiceAccessor, SingletonAccessor, TransientAccessor};
    pub use crate::args::Args;
    pub use crate::descriptor::AccessorDescriptor;
    pub use crate::error::{Result, WakilError};
    pub use crate::lifetime::Lifetime;
    pub use crate::matcher::KeyMatcher;
    pub use crate::options::{FactoryOptions, FailurePolicy};
    pub use crate::provider::{AccessorProvider, AccessorRegistry};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

//! Accessor descriptors, the finished configuration of one accessor.
//!
//! A descriptor is plain data: keys (or a matcher), a lifetime and at
//! least one creation function. [`AccessorDescriptor::build`] validates it
//! and turns it into a ready [`ServiceAccessor`].

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::accessor::{AccessorCore, ServiceAccessor, SingletonAccessor, TransientAccessor};
use crate::args::Args;
use crate::bridge::{AsyncCreateFn, Resolvers, SyncCreateFn, async_fn, sync_fn};
use crate::error::{ConfigurationError, MissingPart, Result, WakilError};
use crate::lifetime::Lifetime;
use crate::matcher::KeyMatcher;
use crate::options::{FactoryOptions, FailurePolicy};

/// Configuration of a single accessor.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use wakil_factory::descriptor::AccessorDescriptor;
/// use wakil_factory::options::FactoryOptions;
///
/// let accessor = AccessorDescriptor::<&str, Arc<String>>::new()
///     .keys(["pdf"])
///     .singleton()
///     .sync_create(|_| Ok(Arc::new(String::from("pdf exporter"))))
///     .build(&FactoryOptions::default())
///     .unwrap();
///
/// assert!(accessor.can_resolve(&"pdf"));
/// ```
pub struct AccessorDescriptor<K, S> {
    pub(crate) keys: Vec<K>,
    pub(crate) matcher: Option<KeyMatcher<K>>,
    pub(crate) lifetime: Option<Lifetime>,
    sync_create: Option<SyncCreateFn<S>>,
    async_create: Option<AsyncCreateFn<S>>,
    priority: i32,
    name: Option<String>,
    failure_policy: Option<FailurePolicy>,
}

impl<K, S> Default for AccessorDescriptor<K, S> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            matcher: None,
            lifetime: None,
            sync_create: None,
            async_create: None,
            priority: 0,
            name: None,
            failure_policy: None,
        }
    }
}

impl<K, S> AccessorDescriptor<K, S>
where
    K: fmt::Debug + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys this accessor owns. Replaces previously set keys.
    pub fn keys(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.keys = keys.into_iter().collect();
        self
    }

    /// Adds one key.
    pub fn key(mut self, key: K) -> Self {
        self.keys.push(key);
        self
    }

    /// Custom key matcher; keys become optional.
    pub fn matcher(mut self, matcher: KeyMatcher<K>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Shorthand for a custom matcher closure.
    pub fn can_resolve_key(self, f: impl Fn(&K, &[K]) -> bool + Send + Sync + 'static) -> Self {
        self.matcher(KeyMatcher::custom(f))
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    /// Synchronous creation function.
    pub fn sync_create(mut self, f: impl Fn(Args) -> Result<S> + Send + Sync + 'static) -> Self {
        self.sync_create = Some(sync_fn(f));
        self
    }

    /// Asynchronous creation function.
    pub fn async_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
    {
        self.async_create = Some(async_fn(f));
        self
    }

    /// Already boxed creation functions.
    pub fn create_fns(mut self, sync: Option<SyncCreateFn<S>>, async_: Option<AsyncCreateFn<S>>) -> Self {
        self.sync_create = sync;
        self.async_create = async_;
        self
    }

    /// Higher priorities are consulted first; equal priorities keep
    /// registration order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the factory-wide singleton failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn get_priority(&self) -> i32 {
        self.priority
    }

    fn config_error(&self, missing: MissingPart) -> WakilError {
        WakilError::Configuration(ConfigurationError {
            service: type_name::<S>(),
            accessor: self.name.clone(),
            missing,
        })
    }

    /// Validates the descriptor and builds its accessor.
    ///
    /// # Errors
    /// [`WakilError::Configuration`] when the lifetime, the keys (with no
    /// custom matcher) or both creation functions are missing.
    pub fn build(self, options: &FactoryOptions) -> Result<Arc<dyn ServiceAccessor<K, S>>>
    where
        K: PartialEq,
    {
        let matcher = self.matcher.clone().unwrap_or_else(KeyMatcher::equality);
        self.build_with_matcher(matcher, options)
    }

    /// Like [`build`](Self::build) for key types without `PartialEq`: a
    /// matcher must have been set.
    pub fn build_custom(self, options: &FactoryOptions) -> Result<Arc<dyn ServiceAccessor<K, S>>> {
        let matcher = self
            .matcher
            .clone()
            .ok_or_else(|| self.config_error(MissingPart::Keys))?;
        self.build_with_matcher(matcher, options)
    }

    fn build_with_matcher(
        self,
        matcher: KeyMatcher<K>,
        options: &FactoryOptions,
    ) -> Result<Arc<dyn ServiceAccessor<K, S>>> {
        let lifetime = self
            .lifetime
            .ok_or_else(|| self.config_error(MissingPart::Lifetime))?;

        if self.keys.is_empty() && !matcher.is_custom() {
            return Err(self.config_error(MissingPart::Keys));
        }

        let missing_resolver = self.config_error(MissingPart::Resolver);
        let resolvers = Resolvers::new(self.sync_create, self.async_create).ok_or(missing_resolver)?;

        trace!(
            service = type_name::<S>(),
            %lifetime,
            name = self.name.as_deref(),
            "Building accessor from descriptor"
        );

        let core = AccessorCore {
            keys: self.keys,
            matcher,
            resolvers,
            name: self.name,
        };

        Ok(match lifetime {
            Lifetime::Transient => Arc::new(TransientAccessor::from_core(core)),
            Lifetime::Singleton => Arc::new(SingletonAccessor::from_core(
                core,
                self.failure_policy.unwrap_or(options.failure_policy),
                options.wait_timeout(),
            )),
        })
    }
}

impl<K: fmt::Debug, S> fmt::Debug for AccessorDescriptor<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorDescriptor")
            .field("keys", &self.keys)
            .field("matcher", &self.matcher)
            .field("lifetime", &self.lifetime)
            .field("sync_create", &self.sync_create.is_some())
            .field("async_create", &self.async_create.is_some())
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish()
    }
}

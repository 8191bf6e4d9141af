//! Sync/async bridging of creation functions.
//!
//! An accessor is given a synchronous creation function, an asynchronous
//! one, or both. [`Resolvers`] always exposes both shapes:
//!
//! ```text
//! sync only   ──>  async = spawn_blocking(sync)            (blocking worker)
//! async only  ──>  sync  = block on a dedicated thread      (own runtime)
//! both        ──>  used as given
//! ```
//!
//! Neither direction wraps the creation error: what the function returns
//! is what the caller gets. A panic inside a bridged function is resumed
//! on the calling thread.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::trace;

use crate::args::Args;
use crate::error::{Result, WakilError};

/// Synchronous creation function.
pub type SyncCreateFn<S> = Arc<dyn Fn(Args) -> Result<S> + Send + Sync>;

/// Asynchronous creation function.
pub type AsyncCreateFn<S> = Arc<dyn Fn(Args) -> BoxFuture<'static, Result<S>> + Send + Sync>;

/// Boxes a closure into a [`SyncCreateFn`].
pub fn sync_fn<S, F>(f: F) -> SyncCreateFn<S>
where
    F: Fn(Args) -> Result<S> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Boxes an async closure into an [`AsyncCreateFn`].
pub fn async_fn<S, F, Fut>(f: F) -> AsyncCreateFn<S>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

/// Which creation functions were actually supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Sync,
    Async,
    Both,
}

/// Both calling conventions of one creation function.
pub struct Resolvers<S> {
    sync: SyncCreateFn<S>,
    async_: AsyncCreateFn<S>,
    origin: Origin,
}

impl<S: Send + 'static> Resolvers<S> {
    /// Bridges whichever functions are present. `None` if neither is.
    pub fn new(sync: Option<SyncCreateFn<S>>, async_: Option<AsyncCreateFn<S>>) -> Option<Self> {
        match (sync, async_) {
            (Some(sync), Some(async_)) => Some(Self {
                sync,
                async_,
                origin: Origin::Both,
            }),
            (Some(sync), None) => Some(Self::from_sync(sync)),
            (None, Some(async_)) => Some(Self::from_async(async_)),
            (None, None) => None,
        }
    }

    pub fn from_sync(sync: SyncCreateFn<S>) -> Self {
        Self {
            async_: async_from_sync(Arc::clone(&sync)),
            sync,
            origin: Origin::Sync,
        }
    }

    pub fn from_async(async_: AsyncCreateFn<S>) -> Self {
        Self {
            sync: sync_from_async(Arc::clone(&async_)),
            async_,
            origin: Origin::Async,
        }
    }

    /// Runs the synchronous shape, blocking the caller.
    #[inline]
    pub fn create(&self, args: Args) -> Result<S> {
        (self.sync)(args)
    }

    /// Runs the asynchronous shape.
    #[inline]
    pub fn create_async(&self, args: Args) -> BoxFuture<'static, Result<S>> {
        (self.async_)(args)
    }
}

impl<S> Resolvers<S> {
    #[inline]
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

impl<S> Clone for Resolvers<S> {
    fn clone(&self) -> Self {
        Self {
            sync: Arc::clone(&self.sync),
            async_: Arc::clone(&self.async_),
            origin: self.origin,
        }
    }
}

impl<S> fmt::Debug for Resolvers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers").field("origin", &self.origin).finish()
    }
}

/// Turns a sync function into an async one running on a blocking worker.
///
/// Outside a tokio runtime there is no worker pool; the function then runs
/// inline when the future is polled.
pub fn async_from_sync<S: Send + 'static>(sync: SyncCreateFn<S>) -> AsyncCreateFn<S> {
    Arc::new(move |args: Args| {
        let sync = Arc::clone(&sync);
        async move {
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                trace!(service = type_name::<S>(), "No runtime, running sync creation inline");
                return sync(args);
            };

            trace!(service = type_name::<S>(), "Running sync creation on blocking worker");
            match handle.spawn_blocking(move || sync(args)).await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => Err(WakilError::Bridge {
                    service: type_name::<S>(),
                    reason: err.to_string(),
                }),
            }
        }
        .boxed()
    })
}

/// Turns an async function into a sync one.
///
/// The future is driven to completion on a dedicated thread with its own
/// current-thread runtime while the caller blocks on the join. The caller's
/// scheduler is never re-entered, so this is safe to call from code that
/// is itself running inside a (possibly single-threaded) runtime.
pub fn sync_from_async<S: Send + 'static>(async_: AsyncCreateFn<S>) -> SyncCreateFn<S> {
    Arc::new(move |args: Args| block_on_bridge_thread(async_(args)))
}

fn block_on_bridge_thread<S: Send + 'static>(future: BoxFuture<'static, Result<S>>) -> Result<S> {
    let service = type_name::<S>();
    trace!(service, "Running async creation on bridge thread");

    let handle = std::thread::Builder::new()
        .name("wakil-bridge".into())
        .spawn(move || -> Result<S> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| WakilError::Bridge {
                    service,
                    reason: e.to_string(),
                })?;
            runtime.block_on(future)
        })
        .map_err(|e| WakilError::Bridge {
            service,
            reason: e.to_string(),
        })?;

    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

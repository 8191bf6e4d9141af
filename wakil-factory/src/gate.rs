//! A mutual-exclusion gate usable from blocking and async code.
//!
//! Singleton accessors must let `resolve` (blocking) and `resolve_async`
//! enter the *same* critical section. Neither `parking_lot::Mutex` (its
//! guard cannot be held across `.await`) nor `tokio::sync::Mutex` (its
//! blocking lock refuses to run inside a runtime) covers both, so the gate
//! keeps one `locked` flag and two wake-up channels:
//!
//! ```text
//!            ┌──────────── locked: parking_lot::Mutex<bool> ────────────┐
//! blocking ──┤ wait on Condvar                 wait on tokio Notify     ├── async
//!            └──────── release(): clear flag, wake both sides ──────────┘
//! ```
//!
//! Waiters may give up after a timeout at any moment. Release never
//! depends on a waiter being present: it clears the flag and wakes
//! whoever is still waiting, and losers of the race go back to sleep.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::debug;

/// The wait for the gate timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimeout;

/// Dual-mode (blocking + async) mutual-exclusion gate.
#[derive(Default)]
pub struct CreationGate {
    locked: Mutex<bool>,
    released: Condvar,
    notify: Notify,
}

/// Holds the gate until dropped.
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a CreationGate,
}

impl CreationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the gate if it is free, without waiting.
    pub fn try_lock(&self) -> Option<GateGuard<'_>> {
        let mut locked = self.locked.lock();
        if *locked {
            return None;
        }
        *locked = true;
        Some(GateGuard { gate: self })
    }

    /// Blocks the current thread until the gate is taken.
    ///
    /// With `timeout`, gives up once it has elapsed.
    pub fn lock_blocking(&self, timeout: Option<Duration>) -> Result<GateGuard<'_>, GateTimeout> {
        let mut locked = self.locked.lock();

        match timeout {
            None => {
                while *locked {
                    self.released.wait(&mut locked);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *locked {
                    if self.released.wait_until(&mut locked, deadline).timed_out() && *locked {
                        return Err(GateTimeout);
                    }
                }
            }
        }

        *locked = true;
        Ok(GateGuard { gate: self })
    }

    /// Waits asynchronously until the gate is taken.
    ///
    /// The `timeout` is enforced with tokio's timer. Polled outside a tokio
    /// runtime there is no timer, and the wait is unbounded.
    pub async fn lock_async(&self, timeout: Option<Duration>) -> Result<GateGuard<'_>, GateTimeout> {
        match timeout {
            Some(timeout) if Handle::try_current().is_ok() => {
                tokio::time::timeout(timeout, self.acquire()).await.map_err(|_| GateTimeout)
            }
            Some(_) => {
                debug!("No tokio runtime, waiting for the gate without a timeout");
                Ok(self.acquire().await)
            }
            None => Ok(self.acquire().await),
        }
    }

    /// Whether some caller currently holds the gate.
    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }

    async fn acquire(&self) -> GateGuard<'_> {
        loop {
            // Register interest before checking the flag so a release
            // between the check and the await is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(guard) = self.try_lock() {
                return guard;
            }
            notified.await;
        }
    }

    fn release(&self) {
        *self.locked.lock() = false;
        self.released.notify_all();
        self.notify.notify_waiters();
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

impl fmt::Debug for CreationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationGate")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl fmt::Debug for GateGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateGuard").finish()
    }
}

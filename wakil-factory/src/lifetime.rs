//! Accessor lifetimes.
//!
//! A lifetime decides how long a resolved service lives inside its accessor:
//! - [`Lifetime::Singleton`]: created once, every resolve returns it
//! - [`Lifetime::Transient`]: created anew on every resolve
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Defines how an accessor reuses the services it creates.
///
/// # Examples
/// ```
/// use wakil_factory::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton.is_cached());
/// assert!(!Lifetime::Transient.is_cached());
/// assert_eq!("singleton".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One instance per accessor.
    ///
    /// Created by whichever caller, sync or async, gets there first.
    /// Every other caller receives that same instance.
    ///
    /// # When to use
    /// - Connection pools, clients, parsed configuration
    /// - Anything expensive that is safe to share
    Singleton,

    /// A new instance on every resolve call.
    ///
    /// Never cached.
    ///
    /// # When to use
    /// - Stateful handlers that must not be shared
    /// - Services built from per-call arguments
    Transient,
}

impl Lifetime {
    /// Returns `true` if this lifetime caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

/// Error returned when parsing an unknown lifetime name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown lifetime {0:?}, expected \"singleton\" or \"transient\"")]
pub struct ParseLifetimeError(pub String);

impl FromStr for Lifetime {
    type Err = ParseLifetimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "transient" => Ok(Lifetime::Transient),
            _ => Err(ParseLifetimeError(s.to_string())),
        }
    }
}

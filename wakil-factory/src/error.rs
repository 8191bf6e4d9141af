//! Error types for Wakil factory operations.
//!
//! Errors name the key or the descriptor field that is wrong, so a
//! failed lookup reads `No accessor for key "missing"` instead of a
//! bare `None`.

use std::fmt;
use std::sync::Arc;

/// Error type a creation function may return, boxed and shared.
pub type CreationSource = Arc<dyn std::error::Error + Send + Sync>;

/// Main error type for all Wakil operations.
///
/// `Clone` so a singleton accessor that caches its failure can hand the
/// very same error to every later caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WakilError {
    /// An accessor descriptor was incomplete when the accessor was built.
    #[error("{}", .0)]
    Configuration(ConfigurationError),

    /// No registered accessor accepts the requested key.
    #[error("{}", .0)]
    NoMatch(NoMatchError),

    /// The creation function failed. The source is exactly what the
    /// creation function produced.
    #[error("Failed to create {service}: {source}")]
    Creation {
        service: &'static str,
        #[source]
        source: CreationSource,
    },

    /// A caller gave up waiting for another caller's singleton creation.
    #[error("Timed out after {waited_ms}ms waiting for {service} to be created by another caller")]
    WaitTimeout { service: &'static str, waited_ms: u64 },

    /// The bridge could not start the execution context it needs.
    #[error("Could not bridge {service} creation across calling conventions: {reason}")]
    Bridge { service: &'static str, reason: String },
}

impl WakilError {
    /// Wraps an error raised inside a creation function.
    ///
    /// ```
    /// use wakil_factory::error::WakilError;
    ///
    /// let err = WakilError::creation::<String>(std::io::Error::other("db down"));
    /// assert!(err.to_string().contains("db down"));
    /// ```
    pub fn creation<S: ?Sized>(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        WakilError::Creation {
            service: std::any::type_name::<S>(),
            source: Arc::new(source),
        }
    }

    /// Wraps an already boxed error raised inside a creation function.
    pub fn creation_boxed<S: ?Sized>(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        WakilError::Creation {
            service: std::any::type_name::<S>(),
            source: Arc::from(source),
        }
    }

    /// The original error of a [`WakilError::Creation`], for downcasting.
    pub fn creation_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            WakilError::Creation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` for [`WakilError::NoMatch`].
    pub fn is_no_match(&self) -> bool {
        matches!(self, WakilError::NoMatch(_))
    }
}

/// What part of an accessor descriptor is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    /// Neither the descriptor nor the builder defaults set a lifetime.
    Lifetime,
    /// Neither a sync nor an async creation function was given.
    Resolver,
    /// No keys and no custom key matcher.
    Keys,
    /// The factory has no accessors and empty factories are disallowed.
    Accessors,
}

/// Error when an accessor descriptor cannot produce a usable accessor.
#[derive(Debug, Clone)]
pub struct ConfigurationError {
    /// Service type the descriptor was meant to produce.
    pub service: &'static str,
    /// Name given to the descriptor, if any.
    pub accessor: Option<String>,
    pub missing: MissingPart,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.missing {
            MissingPart::Lifetime => "Accessor lifetime is not defined",
            MissingPart::Resolver => "Neither a synchronous nor an asynchronous creation function is defined",
            MissingPart::Keys => "No accessor key(s) defined",
            MissingPart::Accessors => "Factory has no accessors",
        };
        write!(f, "Invalid accessor for {}: {what}", self.service)?;

        if let Some(ref name) = self.accessor {
            write!(f, "\n  Accessor: {name}")?;
        }

        let hint = match self.missing {
            MissingPart::Lifetime => "call .singleton() / .transient() or set a builder default",
            MissingPart::Resolver => "call .sync_create(..) or .async_create(..)",
            MissingPart::Keys => "call .keys(..) or supply a custom matcher with .matcher(..)",
            MissingPart::Accessors => "register an accessor or set allow_empty = true",
        };
        write!(f, "\n  Hint: {hint}")
    }
}

/// Error when no accessor accepts a key.
#[derive(Debug, Clone)]
pub struct NoMatchError {
    /// `Debug` rendering of the requested key.
    pub key: String,
    /// Service type the factory produces.
    pub service: &'static str,
    /// Registered keys that look similar.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No accessor for key {} (service {})", self.key, self.service)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: check factory.can_resolve(key) first, or register an accessor for this key"
        )
    }
}

/// Convenient Result type for Wakil operations.
pub type Result<T> = std::result::Result<T, WakilError>;

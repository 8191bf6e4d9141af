//! Key matching.
//!
//! A [`KeyMatcher`] decides whether an accessor owns a candidate key.
//! It receives the candidate and the accessor's own key list, so the same
//! matcher can be shared by many accessors with different keys.

use std::fmt;
use std::sync::Arc;

type MatchFn<K> = dyn Fn(&K, &[K]) -> bool + Send + Sync;

/// Predicate deciding whether a candidate key belongs to an accessor.
///
/// # Examples
/// ```
/// use wakil_factory::matcher::KeyMatcher;
///
/// let keys = vec!["pdf".to_string(), "csv".to_string()];
///
/// let by_eq = KeyMatcher::<String>::equality();
/// assert!(by_eq.matches(&"csv".to_string(), &keys));
/// assert!(!by_eq.matches(&"xml".to_string(), &keys));
///
/// // Keys are ignored by custom matchers that don't look at them
/// let valid = KeyMatcher::custom(|k: &String, _| k.starts_with("Valid"));
/// assert!(valid.matches(&"Validxyz".to_string(), &[]));
/// ```
pub struct KeyMatcher<K> {
    inner: Arc<MatchFn<K>>,
    kind: MatcherKind,
}

/// How a [`KeyMatcher`] was made, for `Debug` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Equality,
    Ordered,
    Prefix,
    Any,
    Custom,
}

impl<K: 'static> KeyMatcher<K> {
    /// Wraps an arbitrary predicate.
    pub fn custom(f: impl Fn(&K, &[K]) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(f),
            kind: MatcherKind::Custom,
        }
    }

    /// Matches every key. Register it last to get a catch-all accessor;
    /// earlier accessors still win for the keys they own.
    pub fn any() -> Self {
        Self {
            inner: Arc::new(|_: &K, _: &[K]| true),
            kind: MatcherKind::Any,
        }
    }

    /// Tests the candidate against the owned keys.
    #[inline]
    pub fn matches(&self, candidate: &K, owned: &[K]) -> bool {
        (self.inner)(candidate, owned)
    }

    #[inline]
    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    /// `true` unless the matcher is the default equality test.
    ///
    /// Accessors with a custom matcher may be built without keys.
    #[inline]
    pub fn is_custom(&self) -> bool {
        !matches!(self.kind, MatcherKind::Equality | MatcherKind::Ordered)
    }
}

impl<K: PartialEq + 'static> KeyMatcher<K> {
    /// Default matcher: the candidate equals one of the owned keys.
    pub fn equality() -> Self {
        Self {
            inner: Arc::new(|candidate: &K, owned: &[K]| owned.iter().any(|k| k == candidate)),
            kind: MatcherKind::Equality,
        }
    }
}

impl<K: Ord + 'static> KeyMatcher<K> {
    /// Matches when the candidate compares `Equal` to an owned key.
    ///
    /// Differs from [`KeyMatcher::equality`] only for types whose `Ord`
    /// is coarser than their `PartialEq`.
    pub fn ordered() -> Self {
        Self {
            inner: Arc::new(|candidate: &K, owned: &[K]| {
                owned.iter().any(|k| candidate.cmp(k) == std::cmp::Ordering::Equal)
            }),
            kind: MatcherKind::Ordered,
        }
    }
}

impl<K: AsRef<str> + 'static> KeyMatcher<K> {
    /// Matches when the candidate starts with one of the owned keys.
    ///
    /// ```
    /// use wakil_factory::matcher::KeyMatcher;
    ///
    /// let m = KeyMatcher::<&str>::prefix();
    /// assert!(m.matches(&"image/png", &["image/"]));
    /// assert!(!m.matches(&"text/html", &["image/"]));
    /// ```
    pub fn prefix() -> Self {
        Self {
            inner: Arc::new(|candidate: &K, owned: &[K]| {
                let candidate = candidate.as_ref();
                owned.iter().any(|k| candidate.starts_with(k.as_ref()))
            }),
            kind: MatcherKind::Prefix,
        }
    }
}

impl<K> Clone for KeyMatcher<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            kind: self.kind,
        }
    }
}

impl<K> fmt::Debug for KeyMatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMatcher({:?})", self.kind)
    }
}

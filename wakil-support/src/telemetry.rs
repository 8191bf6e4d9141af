//! Tracing subscriber setup.
//!
//! Library code only emits events; binaries, demos and tests decide
//! where they go by calling [`init`] or [`init_with`].

use tracing_subscriber::EnvFilter;

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "wakil_factory=info";

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_FILTER`]. Returns `false` when a global
/// subscriber was already installed (e.g. by another test).
pub fn init() -> bool {
    init_with(DEFAULT_FILTER)
}

/// Same as [`init`] with an explicit fallback filter.
pub fn init_with(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init_with("debug");
        assert!(!init());
    }
}

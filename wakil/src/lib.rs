//! # Wakil — keyed service factories for Rust
//!
//! A factory picks one of several registered accessors by key and returns
//! a service from it, either as a fresh instance (transient) or as one
//! shared instance (singleton). Every accessor answers both blocking and
//! async callers, whichever kind of creation function it was given.
//!
//! ```rust
//! use std::sync::Arc;
//! use wakil::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Channel {
//!     Email,
//!     Sms,
//! }
//!
//! let factory = Factory::<Channel, Arc<String>>::builder()
//!     .singleton([Channel::Email], |_| Ok(Arc::new("smtp".to_string())))
//!     .accessor(
//!         AccessorDescriptor::new()
//!             .key(Channel::Sms)
//!             .transient()
//!             .async_create(|_| async { Ok(Arc::new("gateway".to_string())) }),
//!     )
//!     .build()
//!     .expect("Failed to build factory");
//!
//! // An async-only accessor still serves blocking callers
//! let sms = factory.resolve(&Channel::Sms, Args::empty()).expect("Failed to resolve");
//! assert_eq!(sms.as_str(), "gateway");
//! ```

pub use wakil_factory::*;
pub use wakil_support as support;

//! Core implementation of Wakil keyed service factories.

pub mod accessor;
pub mod args;
pub mod bridge;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod gate;
pub mod lifetime;
pub mod matcher;
pub mod options;
pub mod provider;

pub use accessor::{ServiceAccessor, SingletonAccessor, TransientAccessor};
pub use args::Args;
pub use descriptor::AccessorDescriptor;
pub use error::{Result, WakilError};
pub use factory::{Factory, FactoryBuilder, prelude};
pub use lifetime::Lifetime;
pub use matcher::KeyMatcher;
pub use options::{FactoryOptions, FailurePolicy};

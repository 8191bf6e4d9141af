//! Provider trait — a module of related accessor registrations.
//!
//! Providers let each feature area register its own accessors instead of
//! one giant builder chain at startup.
//!
//! # Examples
//! ```rust,ignore
//! struct ExportProvider;
//!
//! impl AccessorProvider<Format, Arc<dyn Exporter>> for ExportProvider {
//!     fn register(&self, registry: &mut dyn AccessorRegistry<Format, Arc<dyn Exporter>>) {
//!         registry.register_descriptor(
//!             AccessorDescriptor::new()
//!                 .keys([Format::Pdf])
//!                 .singleton()
//!                 .sync_create(|_| Ok(Arc::new(PdfExporter) as Arc<dyn Exporter>)),
//!         );
//!     }
//! }
//!
//! let factory = Factory::builder().add_provider(&ExportProvider).build()?;
//! ```

use std::sync::Arc;

use crate::accessor::ServiceAccessor;
use crate::descriptor::AccessorDescriptor;

/// A module that registers related accessors into a factory builder.
pub trait AccessorProvider<K, S>: Send + Sync {
    /// Register accessors. Called once, while the builder is assembled.
    fn register(&self, registry: &mut dyn AccessorRegistry<K, S>);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The part of [`FactoryBuilder`](crate::factory::FactoryBuilder) a
/// provider sees, so providers can be tested against a mock.
pub trait AccessorRegistry<K, S> {
    fn register_descriptor(&mut self, descriptor: AccessorDescriptor<K, S>);

    /// Register an already built accessor with the given priority.
    fn register_accessor(&mut self, accessor: Arc<dyn ServiceAccessor<K, S>>, priority: i32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::factory::Factory;
    use crate::options::FactoryOptions;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Region {
        Eu,
        Us,
        Apac,
    }

    // Mock registry for testing providers
    #[derive(Default)]
    struct MockRegistry {
        descriptors: Vec<AccessorDescriptor<Region, String>>,
        accessor_count: usize,
    }

    impl AccessorRegistry<Region, String> for MockRegistry {
        fn register_descriptor(&mut self, descriptor: AccessorDescriptor<Region, String>) {
            self.descriptors.push(descriptor);
        }

        fn register_accessor(&mut self, _accessor: Arc<dyn ServiceAccessor<Region, String>>, _priority: i32) {
            self.accessor_count += 1;
        }
    }

    struct RegionProvider;

    impl AccessorProvider<Region, String> for RegionProvider {
        fn register(&self, registry: &mut dyn AccessorRegistry<Region, String>) {
            registry.register_descriptor(
                AccessorDescriptor::new()
                    .keys([Region::Eu])
                    .singleton()
                    .sync_create(|_| Ok(String::from("eu-central"))),
            );
            registry.register_descriptor(
                AccessorDescriptor::new()
                    .keys([Region::Us, Region::Apac])
                    .transient()
                    .priority(1)
                    .sync_create(|_| Ok(String::from("global"))),
            );
        }
    }

    #[test]
    fn provider_registers_descriptors() {
        let mut registry = MockRegistry::default();
        RegionProvider.register(&mut registry);

        assert_eq!(registry.descriptors.len(), 2);
        assert_eq!(registry.descriptors[1].get_priority(), 1);
        assert_eq!(registry.accessor_count, 0);
    }

    // Overrides one region with a prebuilt accessor
    struct OverrideProvider;

    impl AccessorProvider<Region, String> for OverrideProvider {
        fn register(&self, registry: &mut dyn AccessorRegistry<Region, String>) {
            let accessor = AccessorDescriptor::new()
                .key(Region::Eu)
                .singleton()
                .name("eu-override")
                .sync_create(|_| Ok(String::from("eu-west")))
                .build(&FactoryOptions::default());

            match accessor {
                Ok(accessor) => registry.register_accessor(accessor, 5),
                Err(err) => panic!("Override accessor failed to build: {err}"),
            }
        }
    }

    #[test]
    fn provider_registers_prebuilt_accessor_with_priority() {
        let mut registry = MockRegistry::default();
        OverrideProvider.register(&mut registry);
        assert_eq!(registry.accessor_count, 1);
        assert!(registry.descriptors.is_empty());

        let factory = Factory::<Region, String>::builder()
            .add_provider(&RegionProvider)
            .add_provider(&OverrideProvider)
            .build()
            .unwrap();

        assert_eq!(factory.len(), 3);
        assert_eq!(factory.get_accessor(&Region::Eu).unwrap().name(), Some("eu-override"));
        assert_eq!(factory.resolve(&Region::Eu, Args::empty()).unwrap(), "eu-west");
        assert_eq!(factory.get_accessors(&Region::Eu).len(), 2);
    }

    #[test]
    fn provider_has_name() {
        assert!(RegionProvider.name().contains("RegionProvider"));
    }

    #[test]
    fn provider_feeds_factory_builder() {
        let factory = Factory::<Region, String>::builder()
            .add_provider(&RegionProvider)
            .build()
            .unwrap();

        assert_eq!(factory.len(), 2);
        assert_eq!(factory.resolve(&Region::Apac, Args::empty()).unwrap(), "global");
        assert_eq!(factory.resolve(&Region::Eu, Args::empty()).unwrap(), "eu-central");
    }
}

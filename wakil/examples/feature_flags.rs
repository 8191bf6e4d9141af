//! Feature services resolved by key, from blocking and async code.
//!
//! Run with `RUST_LOG=wakil_factory=debug cargo run -p wakil --example feature_flags`.

use std::sync::Arc;

use wakil::prelude::*;
use wakil::{args, support::telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feature {
    Search,
    Billing,
    Reports,
}

trait FeatureService: Send + Sync {
    fn message(&self) -> String;
}

struct SearchService {
    index: String,
}

impl FeatureService for SearchService {
    fn message(&self) -> String {
        format!("Search over index {}", self.index)
    }
}

struct BillingService {
    invoice: u32,
}

impl FeatureService for BillingService {
    fn message(&self) -> String {
        format!("Billing, invoice #{}", self.invoice)
    }
}

type Service = Arc<dyn FeatureService>;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_with("wakil_factory=debug");

    let factory = Factory::<Feature, Service>::builder()
        .singleton([Feature::Search], |_| {
            Ok(Arc::new(SearchService {
                index: "products".into(),
            }) as Service)
        })
        .accessor(
            AccessorDescriptor::new()
                .key(Feature::Billing)
                .transient()
                .name("billing")
                .async_create(|args: Args| async move {
                    let invoice = args.get::<u32>(0).copied().unwrap_or_default();
                    tokio::task::yield_now().await;
                    Ok(Arc::new(BillingService { invoice }) as Service)
                }),
        )
        .build()?;

    // Async callers
    let search = factory.resolve_async(&Feature::Search, Args::empty()).await?;
    println!("{}", search.message());

    let billing = factory.resolve_async(&Feature::Billing, args![1042u32]).await?;
    println!("{}", billing.message());

    // A blocking caller reaches the async-only accessor through the bridge
    let billing = tokio::task::spawn_blocking({
        let factory = factory.clone();
        move || factory.resolve(&Feature::Billing, args![7u32])
    })
    .await
    .map_err(|e| WakilError::creation_boxed::<Service>(Box::new(e)))??;
    println!("{}", billing.message());

    // The singleton is shared across calling conventions
    let again = factory.resolve(&Feature::Search, Args::empty())?;
    println!("same search instance: {}", Arc::ptr_eq(&search, &again));

    match factory.resolve(&Feature::Reports, Args::empty()) {
        Err(e) => println!("{e}"),
        Ok(_) => println!("Reports unexpectedly registered"),
    }

    Ok(())
}

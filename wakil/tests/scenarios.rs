//! End-to-end behaviour of factories through the public facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::future::join_all;
use wakil::prelude::*;
use wakil::support::telemetry;

#[derive(Debug)]
struct Item {
    name: String,
}

impl Item {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

const CALLERS: usize = 50;

fn counting_factory(counter: Arc<AtomicU32>, async_creator: bool) -> Factory<String, Arc<Item>> {
    let descriptor = AccessorDescriptor::<String, Arc<Item>>::new()
        .key("A".to_string())
        .singleton();
    let descriptor = if async_creator {
        descriptor.async_create(move |_| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Item::new("async"))
            }
        })
    } else {
        descriptor.sync_create(move |_| {
            std::thread::sleep(Duration::from_millis(50));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Item::new("sync"))
        })
    };

    Factory::builder().accessor(descriptor).build().unwrap()
}

/// Every third caller blocks on an OS thread, the rest await on the
/// runtime, started interleaved.
async fn hammer(factory: Factory<String, Arc<Item>>) -> Vec<Arc<Item>> {
    let mut threads = Vec::new();
    let mut tasks = Vec::new();

    for i in 0..CALLERS {
        let factory = factory.clone();
        if (i * 7) % 3 == 0 {
            threads.push(std::thread::spawn(move || {
                factory.resolve(&"A".to_string(), Args::empty()).unwrap()
            }));
        } else {
            tasks.push(tokio::spawn(async move {
                factory.resolve_async(&"A".to_string(), Args::empty()).await.unwrap()
            }));
        }
    }

    let mut results: Vec<Arc<Item>> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    for thread in threads {
        results.push(thread.join().unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_callers_create_once_with_sync_creator() {
    telemetry::init();
    let counter = Arc::new(AtomicU32::new(0));
    let results = hammer(counting_factory(counter.clone(), false)).await;

    assert_eq!(results.len(), CALLERS);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(results[0].name, "sync");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_callers_create_once_with_async_creator() {
    telemetry::init();
    let counter = Arc::new(AtomicU32::new(0));
    let results = hammer(counting_factory(counter.clone(), true)).await;

    assert_eq!(results.len(), CALLERS);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(results[0].name, "async");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_callers_on_workers_do_not_starve_async_creator() {
    let counter = Arc::new(AtomicU32::new(0));
    let factory = counting_factory(counter.clone(), true);

    let run = async {
        let creator = {
            let factory = factory.clone();
            tokio::spawn(async move { factory.resolve_async(&"A".to_string(), Args::empty()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // More blocking callers than workers, all parked on the gate
        let blocking: Vec<_> = (0..3)
            .map(|_| {
                let factory = factory.clone();
                tokio::spawn(async move { factory.resolve(&"A".to_string(), Args::empty()) })
            })
            .collect();

        let mut results = vec![creator.await.unwrap().unwrap()];
        for task in blocking {
            results.push(task.await.unwrap().unwrap());
        }
        results
    };

    let results = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("singleton resolution stalled");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn singleton_resolves_same_instance() {
    let factory = Factory::<String, Arc<Item>>::builder()
        .singleton(["A".to_string()], |_| Ok(Item::new("x")))
        .build()
        .unwrap();

    let first = factory.resolve(&"A".into(), Args::empty()).unwrap();
    let second = factory.resolve(&"A".into(), Args::empty()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn transient_resolves_distinct_instances() {
    let factory = Factory::<String, Arc<Item>>::builder()
        .transient(["A".to_string()], |_| Ok(Item::new("x")))
        .build()
        .unwrap();

    let first = factory.resolve(&"A".into(), Args::empty()).unwrap();
    let second = factory.resolve(&"A".into(), Args::empty()).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn custom_matcher_without_keys() {
    let factory = Factory::<String, Arc<Item>>::builder()
        .accessor(
            AccessorDescriptor::new()
                .can_resolve_key(|key: &String, _| key.starts_with("Valid"))
                .transient()
                .sync_create(|_| Ok(Item::new("valid"))),
        )
        .build()
        .unwrap();

    assert!(factory.can_resolve(&"Validxyz".into()));
    assert!(!factory.can_resolve(&"Invalid".into()));
}

#[test]
fn missing_key_names_the_key() {
    let factory = Factory::<String, Arc<Item>>::builder()
        .singleton(["A".to_string()], |_| Ok(Item::new("x")))
        .build()
        .unwrap();

    let err = factory.get_accessor(&"missing".into()).err().unwrap();
    assert!(err.is_no_match());
    assert!(err.to_string().contains("missing"));
}

#[test]
fn async_only_accessor_serves_blocking_caller_outside_runtime() {
    let factory = Factory::<u8, Arc<Item>>::builder()
        .accessor(
            AccessorDescriptor::new()
                .key(1)
                .transient()
                .async_create(|args: Args| async move {
                    let name = args.get::<String>(0).cloned().unwrap_or_default();
                    Ok(Arc::new(Item { name }))
                }),
        )
        .build()
        .unwrap();

    let item = factory.resolve(&1, wakil::args!["bridged".to_string()]).unwrap();
    assert_eq!(item.name, "bridged");
}

#[tokio::test]
async fn sync_only_accessor_serves_async_caller() {
    let factory = Factory::<u8, Arc<Item>>::builder()
        .transient([1], |_| Ok(Item::new("blocking")))
        .build()
        .unwrap();

    let item = factory.resolve_async(&1, Args::empty()).await.unwrap();
    assert_eq!(item.name, "blocking");
}

#[tokio::test]
async fn blocking_resolve_inside_current_thread_runtime() {
    let factory = Factory::<u8, Arc<Item>>::builder()
        .accessor(
            AccessorDescriptor::new()
                .key(1)
                .singleton()
                .async_create(|_| async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Item::new("nested"))
                }),
        )
        .build()
        .unwrap();

    // Blocking call from async code must not deadlock the single worker
    let item = factory.resolve(&1, Args::empty()).unwrap();
    let again = factory.resolve_async(&1, Args::empty()).await.unwrap();
    assert!(Arc::ptr_eq(&item, &again));
}

#[test]
fn factory_wide_cached_failure() {
    let attempts = Arc::new(AtomicU32::new(0));
    let factory = Factory::<u8, Arc<Item>>::builder()
        .options(FactoryOptions::default().with_failure_policy(FailurePolicy::Cache))
        .singleton([1], {
            let attempts = attempts.clone();
            move |_| {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(WakilError::creation_boxed::<Item>("backend offline".into()))
            }
        })
        .build()
        .unwrap();

    assert!(factory.resolve(&1, Args::empty()).is_err());
    assert!(factory.resolve(&1, Args::empty()).is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

//! Concurrent gets against a live store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use vcap_bindings::connectors::{BindError, BindingView, ConnectorError, EntryState, OptionsBinder, ServiceSelector};

mod common;

/// Records every bind call; options carry the credentials `uri`.
struct CountingBinder {
    selector: ServiceSelector,
    calls: AtomicUsize,
}

impl CountingBinder {
    fn new() -> Self {
        Self {
            selector: ServiceSelector::new("postgresql").with_service_types(["postgres"]),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OptionsBinder for CountingBinder {
    type Options = String;

    fn connector_name(&self) -> &str {
        "counting"
    }

    fn selector(&self) -> &ServiceSelector {
        &self.selector
    }

    fn bind(&self, view: &BindingView<'_>) -> Result<String, BindError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        view.required_credential("uri").map(str::to_string)
    }
}

#[test]
fn test_stale_entry_rebuilt_exactly_once() {
    const THREADS: usize = 16;

    let store = common::store(None, Some(&common::services_with_uri("postgres://h/d")), None);
    let factory = Arc::new(common::factory(&store, CountingBinder::new()));
    factory.get("db1").unwrap();

    store.replace_services(&common::services_with_uri("postgres://h2/d2")).unwrap();
    assert_eq!(factory.state("db1"), Some(EntryState::Stale));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.get("db1").unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_str(), "postgres://h2/d2");
    }
    assert_eq!(factory.binder().calls(), 2);
    assert_eq!(factory.state("db1"), Some(EntryState::Current));
}

#[test]
fn test_first_build_under_contention_happens_once() {
    const THREADS: usize = 8;

    let store = common::store(None, Some(&common::services_with_uri("postgres://h/d")), None);
    let factory = Arc::new(common::factory(&store, CountingBinder::new()));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.get("db1").unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(factory.binder().calls(), 1);
    assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_reads_never_go_backwards_while_writer_publishes() {
    const VERSIONS: usize = 50;

    let store = common::store(None, Some(&common::services_with_uri("postgres://h/v0")), None);
    let factory = Arc::new(common::factory(&store, CountingBinder::new()));

    let reader = {
        let factory = Arc::clone(&factory);
        thread::spawn(move || {
            let mut last = 0usize;
            loop {
                let uri = factory.get("db1").unwrap();
                let version: usize = uri.rsplit('v').next().unwrap().parse().unwrap();
                assert!(version >= last, "observed v{version} after v{last}");
                last = version;
                if version == VERSIONS {
                    break;
                }
            }
        })
    };

    for version in 1..=VERSIONS {
        store
            .replace_services(&common::services_with_uri(&format!("postgres://h/v{version}")))
            .unwrap();
    }
    reader.join().unwrap();

    assert_eq!(factory.get("db1").unwrap().as_str(), format!("postgres://h/v{VERSIONS}"));
    assert!(factory.binder().calls() <= VERSIONS + 1);
}

#[test]
fn test_unknown_names_under_contention() {
    let store = common::store(None, Some(&common::services_with_uri("postgres://h/d")), None);
    let factory = Arc::new(common::factory(&store, CountingBinder::new()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let factory = Arc::clone(&factory);
            thread::spawn(move || factory.get(&format!("missing-{i}")))
        })
        .collect();

    for handle in handles {
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownBindingName { .. }));
    }
    assert_eq!(factory.binder().calls(), 0);
    assert_eq!(factory.state("missing-0"), None);
}

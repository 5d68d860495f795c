//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vcap_bindings::connectors::{ConnectorFactory, OptionsBinder, PostgresBinder};
use vcap_bindings::environment::{EnvironmentStore, MemorySettingsReader};
use vcap_bindings::lifecycle::ChangeBus;

pub const APPLICATION: &str = r#"{
    "application_id": "fa05c1a9-0fc1-4fbd-bae1-139850dec7a3",
    "application_name": "my-app",
    "application_uris": ["my-app.10.244.0.34.xip.io"],
    "limits": {"disk": 1024, "fds": 16384, "mem": 256},
    "uris": ["my-app.10.244.0.34.xip.io", "my-app2.10.244.0.34.xip.io"]
}"#;

pub const SERVICES: &str = r#"{
    "postgres": [{
        "name": "db1",
        "label": "postgres",
        "tags": ["relational", "postgresql"],
        "plan": "free",
        "credentials": {"uri": "postgres://h/d"}
    }]
}"#;

/// Services document with a single `postgres` binding named `db1` at `uri`.
pub fn services_with_uri(uri: &str) -> String {
    format!(r#"{{"postgres": [{{"name": "db1", "credentials": {{"uri": "{uri}"}}}}]}}"#)
}

/// Local settings document with a PostgreSQL connection string for `name`.
pub fn local_connection_string(name: &str, connection_string: &str) -> String {
    format!(
        r#"{{"client": {{"postgresql": {{"{name}": {{"connection_string": "{connection_string}"}}}}}}}}"#
    )
}

/// A store ingested from in-memory documents.
pub fn store(application: Option<&str>, services: Option<&str>, settings: Option<&str>) -> Arc<EnvironmentStore> {
    let reader = MemorySettingsReader {
        application_json: application.map(str::to_string),
        services_json: services.map(str::to_string),
        settings_json: settings.map(str::to_string),
        ..Default::default()
    };
    Arc::new(EnvironmentStore::from_reader(&reader, Arc::new(ChangeBus::new())).unwrap())
}

pub fn postgres_factory(store: &Arc<EnvironmentStore>) -> ConnectorFactory<PostgresBinder> {
    ConnectorFactory::new(Arc::clone(store), PostgresBinder::new())
}

pub fn factory<B: OptionsBinder>(store: &Arc<EnvironmentStore>, binder: B) -> ConnectorFactory<B> {
    ConnectorFactory::new(Arc::clone(store), binder)
}

/// Write `contents` to `path` in one step so watchers never see a partial file.
pub fn write_atomically(path: &Path, contents: &str) {
    let staging = path.with_extension("staging");
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(&staging, path).unwrap();
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

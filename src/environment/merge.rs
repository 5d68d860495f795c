//! Merging platform documents into one configuration tree.
//!
//! # Layout
//! ```text
//! settings document      → <key>                          (root, lowest precedence)
//! application document   → application:<field>
//! instance metadata      → application:instance_id, ...   (overrides document keys)
//! services document      → services:<type>:<index>:<field>
//! ```
//!
//! # Design Decisions
//! - Binding index is positional within each service type, never sorted
//! - Binding names are indexed during the merge; duplicates within one
//!   service type fail the whole merge
//! - The resulting tree is immutable and replaced wholesale on change

use std::collections::HashSet;
use serde_json::Value;

use crate::environment::flatten::{flatten_into, join_path, FlatMap, KEY_DELIMITER};
use crate::environment::snapshot::BindingSnapshot;
use crate::environment::types::{DocumentKind, IngestError, IngestResult};

/// Root segment for the application document.
pub const APPLICATION_PREFIX: &str = "application";

/// Root segment for the service-bindings document.
pub const SERVICES_PREFIX: &str = "services";

/// Per-instance values supplied by the platform outside the JSON documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceMetadata {
    pub instance_id: Option<String>,
    pub instance_index: Option<String>,
    pub internal_ip: Option<String>,
    pub instance_ip: Option<String>,
    pub port: Option<String>,
}

impl InstanceMetadata {
    fn entries(&self) -> [(&'static str, Option<&String>); 5] {
        [
            ("instance_id", self.instance_id.as_ref()),
            ("instance_index", self.instance_index.as_ref()),
            ("internal_ip", self.internal_ip.as_ref()),
            ("instance_ip", self.instance_ip.as_ref()),
            ("port", self.port.as_ref()),
        ]
    }
}

/// One service binding discovered while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    /// Service type key (e.g. `postgres`).
    pub service_type: String,
    /// Position within the service type's list.
    pub index: usize,
    /// Binding name, unique within the service type.
    pub name: String,
    /// Optional `label` field.
    pub label: Option<String>,
    /// String entries of the `tags` array.
    pub tags: Vec<String>,
    /// Path prefix of this binding in the tree (`services:<type>:<index>`).
    pub prefix: String,
}

impl ServiceBinding {
    /// Path prefix of this binding's credentials subtree.
    pub fn credentials_prefix(&self) -> String {
        join_path(&self.prefix, "credentials")
    }
}

/// Flattened view of every ingested document plus the binding-name index.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    values: FlatMap,
    bindings: Vec<ServiceBinding>,
}

impl ConfigTree {
    /// Merge the three documents and instance metadata into a new tree.
    pub fn merge(
        application: &BindingSnapshot,
        services: &BindingSnapshot,
        settings: &BindingSnapshot,
        instance: &InstanceMetadata,
    ) -> IngestResult<Self> {
        let mut values = FlatMap::new();

        flatten_into(settings.root(), "", &mut values);
        flatten_into(application.root(), APPLICATION_PREFIX, &mut values);
        for (field, value) in instance.entries() {
            if let Some(value) = value {
                values.insert(join_path(APPLICATION_PREFIX, field), value.clone());
            }
        }

        let bindings = index_bindings(services)?;
        flatten_into(services.root(), SERVICES_PREFIX, &mut values);

        Ok(Self { values, bindings })
    }

    /// Look up a single value by full path.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// All flattened values in tree order.
    pub fn values(&self) -> &FlatMap {
        &self.values
    }

    /// Number of flattened values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no document contributed any value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries below `prefix`, keyed relative to it.
    ///
    /// `prefix` matches regardless of ASCII case (`Client:PostgreSql` finds
    /// `client:postgresql:...`); relative keys keep their original case.
    pub fn section(&self, prefix: &str) -> FlatMap {
        let lead = format!("{prefix}{KEY_DELIMITER}");
        self.values
            .iter()
            .filter_map(|(key, value)| {
                strip_prefix_ignore_case(key, &lead)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    /// Distinct immediate child segments below `prefix`, in tree order.
    /// `prefix` matches as in [`ConfigTree::section`].
    pub fn child_keys(&self, prefix: &str) -> Vec<String> {
        let lead = format!("{prefix}{KEY_DELIMITER}");
        let mut seen = HashSet::new();
        let mut children = Vec::new();
        for key in self.values.keys() {
            if let Some(rest) = strip_prefix_ignore_case(key, &lead) {
                let child = rest.split(KEY_DELIMITER).next().unwrap_or(rest);
                if seen.insert(child) {
                    children.push(child.to_string());
                }
            }
        }
        children
    }

    /// Every service binding in ingestion order.
    pub fn bindings(&self) -> &[ServiceBinding] {
        &self.bindings
    }

    /// Bindings of one service type, in ingestion order.
    pub fn bindings_of_type<'a>(&'a self, service_type: &'a str) -> impl Iterator<Item = &'a ServiceBinding> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.service_type == service_type)
    }
}

fn strip_prefix_ignore_case<'k>(key: &'k str, prefix: &str) -> Option<&'k str> {
    let head = key.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &key[prefix.len()..])
}

fn index_bindings(services: &BindingSnapshot) -> IngestResult<Vec<ServiceBinding>> {
    let document = DocumentKind::Services;
    let Value::Object(types) = services.root() else {
        return Err(IngestError::malformed(document, SERVICES_PREFIX, "expected an object keyed by service type"));
    };

    let mut bindings = Vec::new();
    for (service_type, list) in types {
        let type_path = join_path(SERVICES_PREFIX, service_type);
        let Value::Array(list) = list else {
            return Err(IngestError::malformed(document, type_path, "expected an array of bindings"));
        };

        let mut names = HashSet::new();
        for (index, binding) in list.iter().enumerate() {
            let prefix = join_path(&type_path, &index.to_string());
            let Value::Object(fields) = binding else {
                return Err(IngestError::malformed(document, prefix, "expected a binding object"));
            };

            let name = match fields.get("name") {
                Some(Value::String(name)) if !name.is_empty() => name.clone(),
                _ => {
                    return Err(IngestError::malformed(
                        document,
                        join_path(&prefix, "name"),
                        "binding name must be a non-empty string",
                    ))
                }
            };
            match fields.get("credentials") {
                None | Some(Value::Null) | Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(IngestError::malformed(
                        document,
                        join_path(&prefix, "credentials"),
                        "credentials must be an object",
                    ))
                }
            }
            if !names.insert(name.clone()) {
                return Err(IngestError::DuplicateBindingName {
                    document,
                    service_type: service_type.clone(),
                    name,
                });
            }

            let label = fields
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string);
            let tags = fields
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            bindings.push(ServiceBinding {
                service_type: service_type.clone(),
                index,
                name,
                label,
                tags,
                prefix,
            });
        }
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLICATION: &str = r#"{
        "application_id": "X",
        "limits": {"disk": 1024, "mem": 256},
        "uris": ["a.example.com"],
        "users": null
    }"#;

    const SERVICES: &str = r#"{
        "elephantsql": [{
            "name": "elephantsql-c6c60",
            "label": "elephantsql",
            "tags": ["postgres", "postgresql", "relational"],
            "credentials": {"uri": "postgres://u:p@babar.elephantsql.com:5432/u"}
        }],
        "sendgrid": [
            {"name": "mysendgrid", "credentials": {"hostname": "smtp.sendgrid.net"}},
            {"name": "second", "credentials": {"hostname": "smtp2.sendgrid.net"}}
        ]
    }"#;

    fn snapshot(kind: DocumentKind, text: &str) -> BindingSnapshot {
        BindingSnapshot::parse(kind, text).unwrap()
    }

    fn merge(application: &str, services: &str) -> IngestResult<ConfigTree> {
        ConfigTree::merge(
            &snapshot(DocumentKind::Application, application),
            &snapshot(DocumentKind::Services, services),
            &BindingSnapshot::empty(DocumentKind::Settings),
            &InstanceMetadata::default(),
        )
    }

    #[test]
    fn test_application_keys() {
        let tree = merge(APPLICATION, "{}").unwrap();
        assert_eq!(tree.get("application:application_id"), Some("X"));
        assert_eq!(tree.get("application:limits:disk"), Some("1024"));
        assert_eq!(tree.get("application:uris:0"), Some("a.example.com"));
        assert_eq!(tree.get("application:users"), None);
    }

    #[test]
    fn test_service_keys_are_positional() {
        let tree = merge("{}", SERVICES).unwrap();
        assert_eq!(tree.get("services:elephantsql:0:name"), Some("elephantsql-c6c60"));
        assert_eq!(tree.get("services:sendgrid:0:name"), Some("mysendgrid"));
        assert_eq!(tree.get("services:sendgrid:1:name"), Some("second"));
        assert_eq!(
            tree.get("services:sendgrid:1:credentials:hostname"),
            Some("smtp2.sendgrid.net")
        );

        let names: Vec<_> = tree.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["elephantsql-c6c60", "mysendgrid", "second"]);

        let pg = &tree.bindings()[0];
        assert_eq!(pg.label.as_deref(), Some("elephantsql"));
        assert_eq!(pg.tags, vec!["postgres", "postgresql", "relational"]);
        assert_eq!(pg.credentials_prefix(), "services:elephantsql:0:credentials");
    }

    #[test]
    fn test_duplicate_name_in_same_type_fails() {
        let err = merge(
            "{}",
            r#"{"postgres": [{"name": "db1"}, {"name": "db1"}]}"#,
        )
        .unwrap_err();
        match err {
            IngestError::DuplicateBindingName { service_type, name, .. } => {
                assert_eq!(service_type, "postgres");
                assert_eq!(name, "db1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_name_across_types_is_allowed() {
        let tree = merge(
            "{}",
            r#"{"postgres": [{"name": "db1"}], "mysql": [{"name": "db1"}]}"#,
        )
        .unwrap();
        assert_eq!(tree.bindings().len(), 2);
        assert_eq!(tree.bindings_of_type("mysql").count(), 1);
    }

    #[test]
    fn test_missing_name_reports_path() {
        let err = merge("{}", r#"{"postgres": [{"credentials": {}}]}"#).unwrap_err();
        match err {
            IngestError::MalformedDocument { path, .. } => assert_eq!(path, "services:postgres:0:name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_array_service_type_fails() {
        let err = merge("{}", r#"{"postgres": {"name": "db1"}}"#).unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument { .. }));
    }

    #[test]
    fn test_instance_metadata_overrides_application() {
        let instance = InstanceMetadata {
            instance_id: Some("7c19d892".into()),
            instance_index: Some("0".into()),
            port: Some("8888".into()),
            ..Default::default()
        };
        let tree = ConfigTree::merge(
            &snapshot(DocumentKind::Application, r#"{"port": 1}"#),
            &BindingSnapshot::empty(DocumentKind::Services),
            &BindingSnapshot::empty(DocumentKind::Settings),
            &instance,
        )
        .unwrap();
        assert_eq!(tree.get("application:instance_id"), Some("7c19d892"));
        assert_eq!(tree.get("application:instance_index"), Some("0"));
        assert_eq!(tree.get("application:port"), Some("8888"));
        assert_eq!(tree.get("application:internal_ip"), None);
    }

    #[test]
    fn test_section_and_child_keys() {
        let settings = snapshot(
            DocumentKind::Settings,
            r#"{"client": {"postgresql": {"local": {"connection_string": "Host=x"}, "other": {"connection_string": "Host=y"}}}}"#,
        );
        let tree = ConfigTree::merge(
            &BindingSnapshot::empty(DocumentKind::Application),
            &BindingSnapshot::empty(DocumentKind::Services),
            &settings,
            &InstanceMetadata::default(),
        )
        .unwrap();
        assert_eq!(tree.child_keys("client:postgresql"), vec!["local", "other"]);
        let section = tree.section("client:postgresql:local");
        assert_eq!(section.get("connection_string").map(String::as_str), Some("Host=x"));
        assert!(tree.child_keys("client:mysql").is_empty());
    }

    #[test]
    fn test_section_prefix_ignores_case() {
        let settings = snapshot(
            DocumentKind::Settings,
            r#"{"Client": {"PostgreSql": {"myDb": {"ConnectionString": "Host=x"}}}}"#,
        );
        let tree = ConfigTree::merge(
            &BindingSnapshot::empty(DocumentKind::Application),
            &BindingSnapshot::empty(DocumentKind::Services),
            &settings,
            &InstanceMetadata::default(),
        )
        .unwrap();
        assert_eq!(tree.child_keys("client:postgresql"), vec!["myDb"]);
        let section = tree.section("client:postgresql:mydb");
        assert_eq!(section.get("ConnectionString").map(String::as_str), Some("Host=x"));
        assert_eq!(tree.get("client:postgresql:mydb:ConnectionString"), None);
        assert!(tree.section("client:postgresql:my").is_empty());
    }
}

//! Options binding contract.
//!
//! # Responsibilities
//! - Decide which platform bindings belong to a connector (`ServiceSelector`)
//! - Resolve a binding name to its credential and local-settings subtrees
//! - Project those subtrees onto a typed options value (`OptionsBinder`)
//!
//! # Lookup
//! ```text
//! platform:  services:<type>:<index>:credentials:<field>   (selected by type, label or tag)
//! local:     client:<section>:<name>:<field>                (prefix matched ignoring ASCII case)
//! ```
//!
//! # Design Decisions
//! - Binders are explicit field tables, not reflection
//! - Required fields fail with `MissingField`; coercion failures with `InvalidValue`
//! - Names only present in local settings are valid bindings

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

use crate::connectors::types::{BindError, ConnectorError, ConnectorResult};
use crate::environment::flatten::{join_path, FlatMap};
use crate::environment::merge::{ConfigTree, ServiceBinding};

/// Root segment for local per-connector settings.
pub const CLIENT_PREFIX: &str = "client";

/// Projects a resolved binding into a typed options value.
pub trait OptionsBinder: Send + Sync {
    /// The options type produced. Immutable once built.
    type Options: Send + Sync + 'static;

    /// Short connector name for logs and metrics (e.g. `postgresql`).
    fn connector_name(&self) -> &str;

    /// Which bindings this connector consumes.
    fn selector(&self) -> &ServiceSelector;

    /// Build options from one binding's current subtrees.
    fn bind(&self, view: &BindingView<'_>) -> Result<Self::Options, BindError>;
}

/// Selects the platform bindings and local settings section of one connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSelector {
    client_section: String,
    service_types: Vec<String>,
    tags: Vec<String>,
}

impl ServiceSelector {
    /// Selector reading local settings from `client:<client_section>`.
    pub fn new(client_section: impl Into<String>) -> Self {
        Self {
            client_section: client_section.into(),
            ..Default::default()
        }
    }

    /// Also select bindings under these service types.
    pub fn with_service_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Also select bindings whose label or tags contain any of these.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn client_section(&self) -> &str {
        &self.client_section
    }

    fn settings_prefix(&self) -> String {
        join_path(CLIENT_PREFIX, &self.client_section)
    }

    /// True if `binding` belongs to this connector.
    pub fn matches(&self, binding: &ServiceBinding) -> bool {
        let tagged = |value: &str| self.tags.iter().any(|t| t.eq_ignore_ascii_case(value));
        self.service_types.iter().any(|t| *t == binding.service_type)
            || binding.label.as_deref().is_some_and(tagged)
            || binding.tags.iter().any(|t| tagged(t.as_str()))
    }

    /// Binding names known to this connector in ingestion order: platform
    /// bindings first, then names only present in local settings.
    ///
    /// A name bound under more than one selected service type is listed
    /// once, and [`ServiceSelector::view`] rejects it as ambiguous.
    pub fn names(&self, tree: &ConfigTree) -> Vec<String> {
        let mut seen = HashSet::new();
        let platform = tree
            .bindings()
            .iter()
            .filter(|b| self.matches(b))
            .map(|b| b.name.clone());
        let local = tree.child_keys(&self.settings_prefix());
        platform
            .chain(local)
            .filter(|name| seen.insert(name.to_ascii_lowercase()))
            .collect()
    }

    /// Names bound under more than one selected service type.
    pub fn ambiguous_names(&self, tree: &ConfigTree) -> Vec<String> {
        let mut first_type: HashMap<&str, &str> = HashMap::new();
        let mut ambiguous = Vec::new();
        for binding in tree.bindings().iter().filter(|b| self.matches(b)) {
            match first_type.get(binding.name.as_str()) {
                Some(service_type) if *service_type != binding.service_type => {
                    if !ambiguous.contains(&binding.name) {
                        ambiguous.push(binding.name.clone());
                    }
                }
                Some(_) => {}
                None => {
                    first_type.insert(&binding.name, &binding.service_type);
                }
            }
        }
        ambiguous
    }

    /// True if `name` resolves to anything for this connector.
    pub fn contains(&self, tree: &ConfigTree, name: &str) -> bool {
        tree.bindings().iter().any(|b| b.name == name && self.matches(b))
            || tree
                .child_keys(&self.settings_prefix())
                .iter()
                .any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Resolve `name` to its current subtrees.
    pub fn view<'a>(&self, tree: &'a ConfigTree, name: &'a str) -> ConnectorResult<BindingView<'a>> {
        let matched: Vec<&ServiceBinding> = tree
            .bindings()
            .iter()
            .filter(|b| b.name == name && self.matches(b))
            .collect();
        if matched.len() > 1 {
            return Err(ConnectorError::AmbiguousBindingName {
                name: name.to_string(),
                service_types: matched.iter().map(|b| b.service_type.clone()).collect(),
            });
        }
        let binding = matched.first().copied();
        let settings = tree.section(&join_path(&self.settings_prefix(), name));
        if binding.is_none() && settings.is_empty() {
            return Err(ConnectorError::UnknownBindingName {
                name: name.to_string(),
            });
        }
        let credentials = binding
            .map(|b| tree.section(&b.credentials_prefix()))
            .unwrap_or_default();
        Ok(BindingView {
            name,
            binding,
            credentials,
            settings,
        })
    }
}

/// The subtrees of one binding at one point in time.
#[derive(Debug, Clone)]
pub struct BindingView<'a> {
    name: &'a str,
    binding: Option<&'a ServiceBinding>,
    credentials: FlatMap,
    settings: FlatMap,
}

impl<'a> BindingView<'a> {
    /// Build a view directly from subtrees.
    pub fn new(name: &'a str, binding: Option<&'a ServiceBinding>, credentials: FlatMap, settings: FlatMap) -> Self {
        Self {
            name,
            binding,
            credentials,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// The platform binding, if the name is platform-bound.
    pub fn binding(&self) -> Option<&ServiceBinding> {
        self.binding
    }

    /// Credentials subtree, keys relative to `credentials`.
    pub fn credentials(&self) -> &FlatMap {
        &self.credentials
    }

    /// Local settings subtree, keys relative to `client:<section>:<name>`.
    pub fn settings(&self) -> &FlatMap {
        &self.settings
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }

    /// A local setting. Keys match regardless of ASCII case.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .or_else(|| {
                self.settings
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// First present local setting among `keys`.
    pub fn first_setting(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.setting(key))
    }

    /// First present credential among `keys` (aliases in priority order).
    pub fn first_credential(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.credential(key))
    }

    /// A credential that must be present.
    pub fn required_credential(&self, key: &str) -> Result<&str, BindError> {
        self.credential(key).ok_or_else(|| BindError::missing(key))
    }

    /// Parse an optional credential into `T`.
    pub fn parse_credential<T>(&self, key: &str) -> Result<Option<T>, BindError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.credential(key)
            .map(|raw| raw.trim().parse::<T>().map_err(|e| BindError::invalid(key, e)))
            .transpose()
    }
}

//! Raw credentials connector for services without a dedicated options type.

use crate::connectors::binder::{BindingView, OptionsBinder, ServiceSelector};
use crate::connectors::types::BindError;
use crate::environment::flatten::FlatMap;

/// A binding's credentials, flattened relative to `credentials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsOptions {
    pub service_type: Option<String>,
    pub credentials: FlatMap,
}

impl CredentialsOptions {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }
}

/// Binds any selected binding, optionally requiring some credential keys.
#[derive(Debug, Clone)]
pub struct CredentialsBinder {
    name: String,
    selector: ServiceSelector,
    required: Vec<String>,
}

impl CredentialsBinder {
    pub fn new(name: impl Into<String>, selector: ServiceSelector) -> Self {
        Self {
            name: name.into(),
            selector,
            required: Vec::new(),
        }
    }

    /// Fail binding when any of `keys` is absent.
    pub fn require<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl OptionsBinder for CredentialsBinder {
    type Options = CredentialsOptions;

    fn connector_name(&self) -> &str {
        &self.name
    }

    fn selector(&self) -> &ServiceSelector {
        &self.selector
    }

    fn bind(&self, view: &BindingView<'_>) -> Result<CredentialsOptions, BindError> {
        for key in &self.required {
            view.required_credential(key)?;
        }
        Ok(CredentialsOptions {
            service_type: view.binding().map(|b| b.service_type.clone()),
            credentials: view.credentials().clone(),
        })
    }
}

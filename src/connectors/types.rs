//! Connector error definitions.

use thiserror::Error;

/// A credential subtree could not be projected into typed options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A required field is absent.
    #[error("missing required field `{key}`")]
    MissingField { key: String },

    /// A field is present but cannot be coerced to the expected type.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl BindError {
    pub fn missing(key: impl Into<String>) -> Self {
        BindError::MissingField { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BindError::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors returned from [`ConnectorFactory::get`](crate::connectors::ConnectorFactory::get).
///
/// Every variant is local to the failing call; other bindings and later calls
/// for the same binding are unaffected.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No binding with this name exists for the connector.
    #[error("Unknown service binding name `{name}`")]
    UnknownBindingName { name: String },

    /// The name matches bindings in more than one selected service type.
    #[error("Service binding name `{name}` is ambiguous across service types {service_types:?}")]
    AmbiguousBindingName {
        name: String,
        service_types: Vec<String>,
    },

    /// The binding exists but its current credentials could not be bound.
    #[error("Failed to rebuild options for binding `{name}`: {source}")]
    BindingRebuildFailed {
        name: String,
        #[source]
        source: BindError,
    },
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

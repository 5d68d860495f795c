//! Document kinds and ingestion error definitions.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The logical platform document a snapshot was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Application descriptor (`VCAP_APPLICATION`).
    Application,
    /// Service-bindings document (`VCAP_SERVICES`).
    Services,
    /// Local settings document (appsettings-style JSON).
    Settings,
}

impl DocumentKind {
    /// Stable lowercase name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Application => "application",
            DocumentKind::Services => "services",
            DocumentKind::Settings => "settings",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort ingestion of the platform documents.
///
/// None of these are recoverable at ingestion time: the previous tree (if any)
/// stays in effect and no change is signalled.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Raw input is not valid structured data, or has the wrong shape.
    #[error("Malformed {document} document at `{path}`: {reason}")]
    MalformedDocument {
        document: DocumentKind,
        path: String,
        reason: String,
    },

    /// Two bindings of the same service type share a name.
    #[error("Duplicate binding name `{name}` for service type `{service_type}` in {document} document")]
    DuplicateBindingName {
        document: DocumentKind,
        service_type: String,
        name: String,
    },

    /// A document file could not be read.
    #[error("Failed to read {document} document from {}: {source}", path.display())]
    Io {
        document: DocumentKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn malformed(
        document: DocumentKind,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        IngestError::MalformedDocument {
            document,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The document that triggered the failure.
    pub fn document(&self) -> DocumentKind {
        match self {
            IngestError::MalformedDocument { document, .. }
            | IngestError::DuplicateBindingName { document, .. }
            | IngestError::Io { document, .. } => *document,
        }
    }
}

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_document_and_name() {
        let err = IngestError::DuplicateBindingName {
            document: DocumentKind::Services,
            service_type: "postgres".into(),
            name: "db1".into(),
        };
        let text = err.to_string();
        assert!(text.contains("services"));
        assert!(text.contains("db1"));
        assert!(text.contains("postgres"));
        assert_eq!(err.document(), DocumentKind::Services);
    }

    #[test]
    fn test_malformed_display_includes_path() {
        let err = IngestError::malformed(DocumentKind::Application, "limits", "expected object");
        assert_eq!(
            err.to_string(),
            "Malformed application document at `limits`: expected object"
        );
    }
}

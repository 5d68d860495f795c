//! Sources of raw platform documents.
//!
//! # Responsibilities
//! - Read `VCAP_APPLICATION` / `VCAP_SERVICES` and instance variables
//! - Read the same documents from files (local development, watched reloads)
//! - Provide an in-memory source for tests and embedding
//!
//! # Design Decisions
//! - An absent document is not an error; it ingests as `{}`
//! - Readers return raw text; parsing happens in one place (snapshot.rs)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::environment::merge::InstanceMetadata;
use crate::environment::snapshot::BindingSnapshot;
use crate::environment::types::{DocumentKind, IngestError, IngestResult};

pub const APPLICATION_ENV: &str = "VCAP_APPLICATION";
pub const SERVICES_ENV: &str = "VCAP_SERVICES";
pub const INSTANCE_GUID_ENV: &str = "CF_INSTANCE_GUID";
pub const INSTANCE_INDEX_ENV: &str = "CF_INSTANCE_INDEX";
pub const INSTANCE_INTERNAL_IP_ENV: &str = "CF_INSTANCE_INTERNAL_IP";
pub const INSTANCE_IP_ENV: &str = "CF_INSTANCE_IP";
pub const PORT_ENV: &str = "PORT";

/// Supplies the raw text of each platform document.
pub trait SettingsReader: Send + Sync {
    /// Raw text of the given document, or `None` when the source is absent.
    fn read(&self, document: DocumentKind) -> IngestResult<Option<String>>;

    /// Instance metadata supplied alongside the documents.
    fn instance(&self) -> InstanceMetadata {
        InstanceMetadata::default()
    }
}

/// Every parsed input needed to build a configuration tree.
#[derive(Debug, Clone)]
pub struct Documents {
    pub application: BindingSnapshot,
    pub services: BindingSnapshot,
    pub settings: BindingSnapshot,
    pub instance: InstanceMetadata,
}

impl Documents {
    /// All documents empty, no instance metadata.
    pub fn empty() -> Self {
        Self {
            application: BindingSnapshot::empty(DocumentKind::Application),
            services: BindingSnapshot::empty(DocumentKind::Services),
            settings: BindingSnapshot::empty(DocumentKind::Settings),
            instance: InstanceMetadata::default(),
        }
    }

    /// Read and parse every document from `reader`.
    pub fn load(reader: &dyn SettingsReader) -> IngestResult<Self> {
        Ok(Self {
            application: load_one(reader, DocumentKind::Application)?,
            services: load_one(reader, DocumentKind::Services)?,
            settings: load_one(reader, DocumentKind::Settings)?,
            instance: reader.instance(),
        })
    }
}

fn load_one(reader: &dyn SettingsReader, kind: DocumentKind) -> IngestResult<BindingSnapshot> {
    match reader.read(kind)? {
        Some(text) => BindingSnapshot::parse(kind, &text),
        None => Ok(BindingSnapshot::empty(kind)),
    }
}

/// Reads documents and instance metadata from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettingsReader;

impl SettingsReader for EnvSettingsReader {
    fn read(&self, document: DocumentKind) -> IngestResult<Option<String>> {
        Ok(match document {
            DocumentKind::Application => env::var(APPLICATION_ENV).ok(),
            DocumentKind::Services => env::var(SERVICES_ENV).ok(),
            DocumentKind::Settings => None,
        })
    }

    fn instance(&self) -> InstanceMetadata {
        InstanceMetadata {
            instance_id: env::var(INSTANCE_GUID_ENV).ok(),
            instance_index: env::var(INSTANCE_INDEX_ENV).ok(),
            internal_ip: env::var(INSTANCE_INTERNAL_IP_ENV).ok(),
            instance_ip: env::var(INSTANCE_IP_ENV).ok(),
            port: env::var(PORT_ENV).ok(),
        }
    }
}

/// Reads documents from files, falling back to the environment for any
/// document without a configured path.
#[derive(Debug, Clone, Default)]
pub struct FileSettingsReader {
    pub application_path: Option<PathBuf>,
    pub services_path: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
}

impl FileSettingsReader {
    /// Path configured for `document`, if any.
    pub fn path(&self, document: DocumentKind) -> Option<&Path> {
        match document {
            DocumentKind::Application => self.application_path.as_deref(),
            DocumentKind::Services => self.services_path.as_deref(),
            DocumentKind::Settings => self.settings_path.as_deref(),
        }
    }

    /// Every configured path.
    pub fn paths(&self) -> Vec<PathBuf> {
        [&self.application_path, &self.services_path, &self.settings_path]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

impl SettingsReader for FileSettingsReader {
    fn read(&self, document: DocumentKind) -> IngestResult<Option<String>> {
        match self.path(document) {
            Some(path) => fs::read_to_string(path)
                .map(Some)
                .map_err(|source| IngestError::Io {
                    document,
                    path: path.to_path_buf(),
                    source,
                }),
            None => EnvSettingsReader.read(document),
        }
    }

    fn instance(&self) -> InstanceMetadata {
        EnvSettingsReader.instance()
    }
}

/// In-memory documents.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsReader {
    pub application_json: Option<String>,
    pub services_json: Option<String>,
    pub settings_json: Option<String>,
    pub instance: InstanceMetadata,
}

impl SettingsReader for MemorySettingsReader {
    fn read(&self, document: DocumentKind) -> IngestResult<Option<String>> {
        Ok(match document {
            DocumentKind::Application => self.application_json.clone(),
            DocumentKind::Services => self.services_json.clone(),
            DocumentKind::Settings => self.settings_json.clone(),
        })
    }

    fn instance(&self) -> InstanceMetadata {
        self.instance.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::merge::ConfigTree;
    use std::io::Write;

    #[test]
    fn test_memory_reader_loads_all_documents() {
        let reader = MemorySettingsReader {
            application_json: Some(r#"{"name": "my-app"}"#.into()),
            services_json: Some(r#"{"postgres": [{"name": "db1"}]}"#.into()),
            settings_json: None,
            instance: InstanceMetadata {
                instance_ip: Some("10.41.1.1".into()),
                ..Default::default()
            },
        };
        let docs = Documents::load(&reader).unwrap();
        let tree = ConfigTree::merge(&docs.application, &docs.services, &docs.settings, &docs.instance).unwrap();
        assert_eq!(tree.get("application:name"), Some("my-app"));
        assert_eq!(tree.get("application:instance_ip"), Some("10.41.1.1"));
        assert_eq!(tree.get("services:postgres:0:name"), Some("db1"));
    }

    #[test]
    fn test_file_reader_reads_configured_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"postgres": []}}"#).unwrap();

        let reader = FileSettingsReader {
            services_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let text = reader.read(DocumentKind::Services).unwrap();
        assert_eq!(text.as_deref(), Some(r#"{"postgres": []}"#));
        assert_eq!(reader.paths(), vec![file.path().to_path_buf()]);
    }

    #[test]
    fn test_file_reader_missing_file_is_io_error() {
        let reader = FileSettingsReader {
            settings_path: Some(PathBuf::from("/nonexistent/settings.json")),
            ..Default::default()
        };
        let err = reader.read(DocumentKind::Settings).unwrap_err();
        assert!(matches!(err, IngestError::Io { document: DocumentKind::Settings, .. }));
    }
}

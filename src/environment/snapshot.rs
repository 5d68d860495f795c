//! Immutable parsed platform documents.

use std::sync::Arc;
use serde_json::{Map, Value};

use crate::environment::flatten::{flatten, FlatMap};
use crate::environment::types::{DocumentKind, IngestError, IngestResult};

/// One parsed document at a point in time.
///
/// Snapshots are never edited; a changed source produces a new snapshot that
/// replaces the old one wholesale. Cloning shares the parsed tree.
#[derive(Debug, Clone)]
pub struct BindingSnapshot {
    kind: DocumentKind,
    root: Arc<Value>,
}

impl BindingSnapshot {
    /// An empty document (`{}`), used when a source is absent.
    pub fn empty(kind: DocumentKind) -> Self {
        Self {
            kind,
            root: Arc::new(Value::Object(Map::new())),
        }
    }

    /// Parse raw JSON text.
    ///
    /// Blank text is treated as an absent document. The root must be an object.
    pub fn parse(kind: DocumentKind, text: &str) -> IngestResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty(kind));
        }
        let value: Value = serde_json::from_str(text).map_err(|e| {
            IngestError::malformed(kind, format!("line {} column {}", e.line(), e.column()), e.to_string())
        })?;
        Self::from_value(kind, value)
    }

    /// Wrap an already-parsed tree.
    pub fn from_value(kind: DocumentKind, value: Value) -> IngestResult<Self> {
        if !value.is_object() {
            return Err(IngestError::malformed(
                kind,
                "",
                "document root must be a JSON object",
            ));
        }
        Ok(Self {
            kind,
            root: Arc::new(value),
        })
    }

    /// Which document family this snapshot came from.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The parsed tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Flatten the whole document with no prefix.
    pub fn flatten(&self) -> FlatMap {
        flatten(&self.root)
    }
}

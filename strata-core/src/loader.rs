//! Tolerant loading of structured documents.
//!
//! Two entry points share one parser:
//!
//! - [`parse_document`] is strict and returns the parser diagnostic. The
//!   compliance engine uses it so malformed files become findings.
//! - [`load_structured`] never fails. Missing and malformed files both
//!   degrade to the empty document, and the [`LoadStatus`] records which
//!   case applied.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// A parsed metadata, config, metrics or system document.
pub type Document = Value;

/// The document every absent or unparseable file degrades to.
pub fn empty_document() -> Document {
    Value::Object(Map::new())
}

/// On-disk format of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Nested key-value configuration (metadata.yaml, config.yaml).
    Yaml,
    /// Plain data interchange (metrics.json, system.json).
    Json,
}

/// How a tolerant load went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Parsed,
    Missing,
    /// Parse or read failure, with the swallowed diagnostic.
    Malformed(String),
}

/// Result of [`load_structured`]: always a usable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub document: Document,
    pub status: LoadStatus,
}

impl Loaded {
    pub fn is_parsed(&self) -> bool {
        self.status == LoadStatus::Parsed
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Parse a document strictly.
///
/// An empty file (or one containing only `null`) parses to `Value::Null`.
/// Non-mapping top-level values are returned as-is; callers that need a
/// mapping check the shape themselves.
pub fn parse_document(path: &Path, format: DocumentFormat) -> Result<Document, DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content, format)
}

/// Parse document text strictly.
pub fn parse_str(content: &str, format: DocumentFormat) -> Result<Document, DocumentError> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        DocumentFormat::Json => serde_json::from_str(content)?,
    })
}

/// Load a document, never failing. A null document loads as `{}`.
pub fn load_structured(path: &Path, format: DocumentFormat) -> Loaded {
    match parse_document(path, format) {
        Ok(Value::Null) => Loaded {
            document: empty_document(),
            status: LoadStatus::Parsed,
        },
        Ok(document) => Loaded {
            document,
            status: LoadStatus::Parsed,
        },
        Err(DocumentError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Loaded {
            document: empty_document(),
            status: LoadStatus::Missing,
        },
        Err(e) => {
            tracing::debug!("Treating {} as empty: {}", path.display(), e);
            Loaded {
                document: empty_document(),
                status: LoadStatus::Malformed(e.to_string()),
            }
        }
    }
}

/// Read at most `max_chars` characters from a text file.
///
/// Truncation happens on character boundaries. Invalid UTF-8 is replaced
/// rather than rejected. A missing or unreadable file yields `""`.
pub fn read_preview(path: &Path, max_chars: usize) -> String {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return String::new(),
    };

    // A UTF-8 character is at most 4 bytes, so this always covers max_chars.
    let limit = (max_chars as u64).saturating_mul(4);
    let mut bytes = Vec::new();
    if let Err(e) = file.take(limit).read_to_end(&mut bytes) {
        tracing::debug!("Failed to read preview of {}: {}", path.display(), e);
        return String::new();
    }

    String::from_utf8_lossy(&bytes).chars().take(max_chars).collect()
}

/// Look up a field of a mapping document.
pub fn field<'a>(doc: &'a Document, key: &str) -> Option<&'a Value> {
    doc.as_object().and_then(|m| m.get(key))
}

/// Render a scalar field as text; absent or null fields become `""`.
pub fn field_text(doc: &Document, key: &str) -> String {
    field(doc, key).map(value_text).unwrap_or_default()
}

/// Render any value as display text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

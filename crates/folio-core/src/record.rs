//! Records — the opaque JSON documents held in named collections.
//!
//! A record is identified by a string ID that is unique within its
//! collection. IDs are compared by exact string equality and never coerced
//! to numbers.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  /// Wrap a non-empty string as a record ID.
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.is_empty() {
      return Err(Error::EmptyId);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for RecordId {
  fn as_ref(&self) -> &str { &self.0 }
}

/// Field names and collection slugs may only contain ASCII alphanumerics,
/// `_` and `-`. Both end up inside JSON paths and URLs.
fn is_plain_name(name: &str) -> bool {
  !name.is_empty()
    && name
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn validate_collection(slug: &str) -> Result<()> {
  if is_plain_name(slug) {
    Ok(())
  } else {
    Err(Error::InvalidCollection(slug.to_owned()))
  }
}

pub fn validate_field(name: &str) -> Result<()> {
  if is_plain_name(name) {
    Ok(())
  } else {
    Err(Error::InvalidField(name.to_owned()))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id:         RecordId,
  pub collection: String,
  pub data:       Map<String, Value>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Record {
  /// The value stored under `field`, if any.
  pub fn field(&self, field: &str) -> Option<&Value> { self.data.get(field) }

  /// The record's natural key, when it has one.
  pub fn slug(&self) -> Option<&str> { self.data.get("slug").and_then(Value::as_str) }
}

/// Input to [`RecordStore::create`](crate::store::RecordStore::create).
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
  pub data: Map<String, Value>,
  pub file: Option<FileUpload>,
}

impl NewRecord {
  pub fn new(data: Map<String, Value>) -> Self { Self { data, file: None } }

  pub fn with_file(mut self, file: FileUpload) -> Self {
    self.file = Some(file);
    self
  }
}

/// Raw bytes attached to a record on creation (media uploads).
#[derive(Debug, Clone)]
pub struct FileUpload {
  pub filename:  String,
  pub mime_type: String,
  pub bytes:     Bytes,
}

impl FileUpload {
  /// Fields the store merges into the owning record's data.
  pub fn describe(&self, record_id: &RecordId) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("filename".into(), Value::String(self.filename.clone()));
    meta.insert("mimeType".into(), Value::String(self.mime_type.clone()));
    meta.insert("filesize".into(), Value::from(self.bytes.len() as u64));
    meta.insert("url".into(), Value::String(format!("/files/{record_id}")));
    meta
  }
}

/// An uploaded file as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredFile {
  pub record_id: RecordId,
  pub filename:  String,
  pub mime_type: String,
  pub bytes:     Bytes,
}

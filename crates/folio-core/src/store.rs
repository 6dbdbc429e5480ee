//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! The write pipeline in [`crate::cms`] and the HTTP layer depend on this
//! abstraction, not on any concrete backend. The store itself enforces no
//! referential integrity between records.

use std::future::Future;

use serde_json::{Map, Value};

use crate::record::{NewRecord, Record, RecordId, StoredFile};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Predicate over a record's top-level data fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Filter {
  #[default]
  All,
  /// `data[field]` is exactly this string.
  Equals { field: String, value: String },
  /// `data[field]` holds a reference to `id`, either as its single value or
  /// as a member of an array. All reference shapes understood by
  /// [`Reference`](crate::reference::Reference) match.
  Contains { field: String, id: RecordId },
}

/// Parameters for [`RecordStore::find`].
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
  pub filter: Filter,
  /// `None` returns every match.
  pub limit:  Option<usize>,
}

impl FindQuery {
  pub fn all() -> Self { Self::default() }

  pub fn slug(slug: impl Into<String>) -> Self {
    Self {
      filter: Filter::Equals { field: "slug".into(), value: slug.into() },
      limit:  Some(1),
    }
  }

  pub fn contains(field: impl Into<String>, id: RecordId) -> Self {
    Self { filter: Filter::Contains { field: field.into(), id }, limit: None }
  }

  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a record store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Records of `collection` matching `query`, oldest first.
  fn find<'a>(
    &'a self,
    collection: &'a str,
    query: &'a FindQuery,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Retrieve a record by ID. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    collection: &'a str,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Persist a new record with a store-assigned ID. An attached file is
  /// stored alongside and described in the record's data.
  fn create<'a>(
    &'a self,
    collection: &'a str,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + 'a;

  /// Shallow-merge `partial` into the record's data, keyed by field name.
  ///
  /// Returns an error if the record does not exist.
  fn update<'a>(
    &'a self,
    collection: &'a str,
    id: &'a RecordId,
    partial: Map<String, Value>,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + 'a;

  /// Remove a record. Returns `false` if nothing was deleted.
  fn delete<'a>(
    &'a self,
    collection: &'a str,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The file uploaded with record `id`, if any.
  fn get_file<'a>(
    &'a self,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<Option<StoredFile>, Self::Error>> + Send + 'a;
}

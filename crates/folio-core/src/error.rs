//! Error types for `folio-core`.

use thiserror::Error;

use crate::record::RecordId;

/// A boxed backend error, as carried across the [`RecordStore`] boundary.
///
/// [`RecordStore`]: crate::store::RecordStore
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record not found: {collection}/{id}")]
  NotFound { collection: String, id: RecordId },

  #[error("invalid collection slug: {0:?}")]
  InvalidCollection(String),

  #[error("invalid field name: {0:?}")]
  InvalidField(String),

  #[error("record ids must be non-empty")]
  EmptyId,

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

/// Failure of a reference-cleanup pass as a whole.
///
/// Per-record write failures never surface here; they are logged and counted
/// in the [`CleanupReport`](crate::cleanup::CleanupReport) instead.
#[derive(Debug, Error)]
pub enum CleanupError {
  #[error("scan of {collection}.{field} for {target} failed: {source}")]
  Scan {
    collection: String,
    field:      String,
    target:     RecordId,
    #[source]
    source:     BoxError,
  },

  #[error("invalid field name: {0:?}")]
  InvalidField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

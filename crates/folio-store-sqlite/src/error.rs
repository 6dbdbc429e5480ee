//! Error type for `folio-store-sqlite`.

use folio_core::record::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("stored data for {0} is not a JSON object")]
  NotAnObject(RecordId),

  #[error("record not found: {collection}/{id}")]
  NotFound { collection: String, id: RecordId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

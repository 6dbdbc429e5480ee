//! ETag computation for records.
//!
//! A record's ETag is a SHA-256 over its ID and `updated_at`, so any write
//! through the store produces a new tag.

use folio_core::record::Record;
use sha2::{Digest, Sha256};

pub fn compute_etag(record: &Record) -> String {
  let mut hasher = Sha256::new();
  hasher.update(record.id.as_str().as_bytes());
  hasher.update([0u8]);
  hasher.update(record.updated_at.timestamp_micros().to_le_bytes());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Handles `*` and comma-separated lists; weak tags compare by their opaque
/// part, as RFC 9110 requires for this header.
pub fn if_none_match(header: &str, etag: &str) -> bool {
  let etag = etag.trim_start_matches("W/");
  header
    .split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}

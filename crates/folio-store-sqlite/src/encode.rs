//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and record data as compact JSON.
//! Field names reach SQL only as JSON path parameters built by [`json_path`].

use chrono::{DateTime, Utc};
use folio_core::record::{Record, RecordId, validate_field};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Data
// ─────────────────────────────────────────────────────────────────────

pub fn encode_data(data: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(data)?)
}

pub fn decode_data(id: &RecordId, s: &str) -> Result<Map<String, Value>> {
  match serde_json::from_str(s)? {
    Value::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject(id.clone())),
  }
}

/// JSON path selecting top-level `field`, e.g. `$."relatedProducts"`.
pub fn json_path(field: &str) -> Result<String> {
  validate_field(field)?;
  Ok(format!("$.\"{field}\""))
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Intermediate row read from the `records` table before decoding.
pub struct RawRecord {
  pub collection: String,
  pub record_id:  String,
  pub data_json:  String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "collection, record_id, data_json, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection: row.get(0)?,
      record_id:  row.get(1)?,
      data_json:  row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let id = RecordId::new(self.record_id)?;
    Ok(Record {
      data:       decode_data(&id, &self.data_json)?,
      id,
      collection: self.collection,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

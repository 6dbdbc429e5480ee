//! Reference-integrity cleanup for deleted records.
//!
//! The store has no foreign keys, so deleting a record can leave other
//! records pointing at an ID that no longer exists. A cleanup pass scans one
//! relationship field for references to the deleted ID and rewrites each
//! referencing record without them.
//!
//! Cleanup is best effort. A failed scan is returned to the caller as a
//! [`CleanupError`] for logging; a failed write to one record is logged and
//! counted, and the pass moves on to the next record.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
  error::CleanupError,
  record::{Record, RecordId, validate_field},
  reference::strip_field,
  store::{FindQuery, RecordStore},
};

/// A relationship field to scrub: `field` on records of `collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipWatch {
  pub collection: String,
  pub field:      String,
}

impl RelationshipWatch {
  pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
    Self { collection: collection.into(), field: field.into() }
  }
}

/// What one cleanup pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
  pub collection: String,
  pub field:      String,
  pub target:     RecordId,
  /// Distinct referencing records returned by the scan.
  pub scanned:    usize,
  pub updated:    usize,
  pub unchanged:  usize,
  pub failed:     usize,
}

// ─── Scanner ─────────────────────────────────────────────────────────────────

/// All records in `watch.collection` whose `watch.field` references
/// `target`.
pub async fn find_referencing<S>(
  store:  &S,
  watch:  &RelationshipWatch,
  target: &RecordId,
) -> Result<Vec<Record>, CleanupError>
where
  S: RecordStore,
{
  validate_field(&watch.field).map_err(|_| CleanupError::InvalidField(watch.field.clone()))?;

  let query = FindQuery::contains(watch.field.clone(), target.clone());
  store
    .find(&watch.collection, &query)
    .await
    .map_err(|e| CleanupError::Scan {
      collection: watch.collection.clone(),
      field:      watch.field.clone(),
      target:     target.clone(),
      source:     Box::new(e),
    })
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Remove every reference to `target` from `watch.field`.
///
/// Candidates are processed one at a time. Each is re-read right before it
/// is rewritten, and a write is only issued when the field actually lost an
/// entry. The deleted record itself is never rewritten.
pub async fn cleanup_references<S>(
  store:  &S,
  watch:  &RelationshipWatch,
  target: &RecordId,
) -> Result<CleanupReport, CleanupError>
where
  S: RecordStore,
{
  let candidates = find_referencing(store, watch, target).await?;

  let mut seen = HashSet::new();
  let ids: Vec<RecordId> = candidates
    .into_iter()
    .map(|r| r.id)
    .filter(|id| id != target && seen.insert(id.clone()))
    .collect();

  let mut report = CleanupReport {
    collection: watch.collection.clone(),
    field:      watch.field.clone(),
    target:     target.clone(),
    scanned:    ids.len(),
    updated:    0,
    unchanged:  0,
    failed:     0,
  };

  for id in &ids {
    match scrub_record(store, watch, id, target).await {
      Ok(true) => {
        debug!(collection = %watch.collection, %id, field = %watch.field, %target, "removed reference");
        report.updated += 1;
      }
      Ok(false) => report.unchanged += 1,
      Err(e) => {
        warn!(
          collection = %watch.collection,
          %id,
          field = %watch.field,
          %target,
          error = %e,
          "failed to remove reference; continuing",
        );
        report.failed += 1;
      }
    }
  }

  Ok(report)
}

/// Rewrite one record's field without `target`. Returns whether a write was
/// issued.
async fn scrub_record<S>(
  store:  &S,
  watch:  &RelationshipWatch,
  id:     &RecordId,
  target: &RecordId,
) -> Result<bool, S::Error>
where
  S: RecordStore,
{
  let Some(record) = store.get(&watch.collection, id).await? else {
    return Ok(false);
  };
  let Some(current) = record.field(&watch.field) else {
    return Ok(false);
  };

  let stripped = strip_field(current, target.as_str());
  if !lost_entries(current, &stripped) {
    return Ok(false);
  }

  let mut partial = Map::new();
  partial.insert(watch.field.clone(), stripped);
  store.update(&watch.collection, id, partial).await?;
  Ok(true)
}

fn lost_entries(before: &Value, after: &Value) -> bool {
  match (before, after) {
    (Value::Array(b), Value::Array(a)) => b.len() != a.len(),
    (b, a) => b != a,
  }
}

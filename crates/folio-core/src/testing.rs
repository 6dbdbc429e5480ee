//! In-memory [`RecordStore`] doubles for unit tests.

use std::{
  collections::HashSet,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  record::{NewRecord, Record, RecordId, StoredFile},
  reference::field_references,
  store::{Filter, FindQuery, RecordStore},
};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TestError(pub String);

pub fn id(s: &str) -> RecordId { RecordId::new(s).unwrap() }

#[derive(Default)]
pub struct MemoryStore {
  records:        Mutex<Vec<Record>>,
  files:          Mutex<Vec<StoredFile>>,
  updates:        Mutex<Vec<(String, RecordId)>>,
  failing_ids:    Mutex<HashSet<String>>,
  duplicate_find: AtomicBool,
  next_id:        AtomicUsize,
}

impl MemoryStore {
  pub fn insert(&self, collection: &str, rid: &str, data: Value) {
    let Value::Object(data) = data else { panic!("record data must be an object") };
    let now = Utc::now();
    self.records.lock().unwrap().push(Record {
      id: id(rid),
      collection: collection.to_owned(),
      data,
      created_at: now,
      updated_at: now,
    });
  }

  /// `data[field]` of a stored record, `Null` when absent.
  pub fn field(&self, collection: &str, rid: &str, field: &str) -> Value {
    self
      .records
      .lock()
      .unwrap()
      .iter()
      .find(|r| r.collection == collection && r.id.as_str() == rid)
      .and_then(|r| r.data.get(field).cloned())
      .unwrap_or(Value::Null)
  }

  pub fn count(&self, collection: &str) -> usize {
    self.records.lock().unwrap().iter().filter(|r| r.collection == collection).count()
  }

  pub fn records(&self, collection: &str) -> Vec<Record> {
    self
      .records
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.collection == collection)
      .cloned()
      .collect()
  }

  pub fn file_count(&self) -> usize { self.files.lock().unwrap().len() }

  pub fn updates(&self) -> Vec<(String, RecordId)> { self.updates.lock().unwrap().clone() }

  pub fn duplicate_find_results(&self, on: bool) { self.duplicate_find.store(on, Ordering::SeqCst); }

  pub fn fail_updates_for(&self, rid: &str) {
    self.failing_ids.lock().unwrap().insert(rid.to_owned());
  }

  fn matches(record: &Record, filter: &Filter) -> bool {
    match filter {
      Filter::All => true,
      Filter::Equals { field, value } => {
        record.field(field).and_then(Value::as_str) == Some(value.as_str())
      }
      Filter::Contains { field, id } => record
        .field(field)
        .is_some_and(|v| field_references(v, id.as_str())),
    }
  }
}

impl RecordStore for MemoryStore {
  type Error = TestError;

  async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>, TestError> {
    let mut found: Vec<Record> = self
      .records(collection)
      .into_iter()
      .filter(|r| Self::matches(r, &query.filter))
      .collect();
    if self.duplicate_find.load(Ordering::SeqCst) {
      found.extend(found.clone());
    }
    if let Some(limit) = query.limit {
      found.truncate(limit);
    }
    Ok(found)
  }

  async fn get(&self, collection: &str, rid: &RecordId) -> Result<Option<Record>, TestError> {
    Ok(self.records(collection).into_iter().find(|r| &r.id == rid))
  }

  async fn create(&self, collection: &str, input: NewRecord) -> Result<Record, TestError> {
    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
    let rid = id(&format!("{collection}-{n}"));
    let mut data = input.data;
    if let Some(file) = input.file {
      data.extend(file.describe(&rid));
      self.files.lock().unwrap().push(StoredFile {
        record_id: rid.clone(),
        filename:  file.filename,
        mime_type: file.mime_type,
        bytes:     file.bytes,
      });
    }
    let now = Utc::now();
    let record = Record {
      id: rid,
      collection: collection.to_owned(),
      data,
      created_at: now,
      updated_at: now,
    };
    self.records.lock().unwrap().push(record.clone());
    Ok(record)
  }

  async fn update(
    &self,
    collection: &str,
    rid: &RecordId,
    partial: Map<String, Value>,
  ) -> Result<Record, TestError> {
    if self.failing_ids.lock().unwrap().contains(rid.as_str()) {
      return Err(TestError(format!("update of {rid} refused")));
    }
    let mut records = self.records.lock().unwrap();
    let record = records
      .iter_mut()
      .find(|r| r.collection == collection && &r.id == rid)
      .ok_or_else(|| TestError(format!("{collection}/{rid} not found")))?;
    record.data.extend(partial);
    record.updated_at = Utc::now();
    self.updates.lock().unwrap().push((collection.to_owned(), rid.clone()));
    Ok(record.clone())
  }

  async fn delete(&self, collection: &str, rid: &RecordId) -> Result<bool, TestError> {
    let mut records = self.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| !(r.collection == collection && &r.id == rid));
    Ok(records.len() != before)
  }

  async fn get_file(&self, rid: &RecordId) -> Result<Option<StoredFile>, TestError> {
    Ok(self.files.lock().unwrap().iter().find(|f| &f.record_id == rid).cloned())
  }
}

/// Wraps a [`MemoryStore`] and fails reference scans (`Contains` queries).
pub struct FailingStore {
  pub inner: MemoryStore,
}

impl FailingStore {
  pub fn scans(inner: MemoryStore) -> Self { Self { inner } }
}

impl RecordStore for FailingStore {
  type Error = TestError;

  async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>, TestError> {
    if matches!(query.filter, Filter::Contains { .. }) {
      return Err(TestError("scan timed out".into()));
    }
    self.inner.find(collection, query).await
  }

  async fn get(&self, collection: &str, rid: &RecordId) -> Result<Option<Record>, TestError> {
    self.inner.get(collection, rid).await
  }

  async fn create(&self, collection: &str, input: NewRecord) -> Result<Record, TestError> {
    self.inner.create(collection, input).await
  }

  async fn update(
    &self,
    collection: &str,
    rid: &RecordId,
    partial: Map<String, Value>,
  ) -> Result<Record, TestError> {
    self.inner.update(collection, rid, partial).await
  }

  async fn delete(&self, collection: &str, rid: &RecordId) -> Result<bool, TestError> {
    self.inner.delete(collection, rid).await
  }

  async fn get_file(&self, rid: &RecordId) -> Result<Option<StoredFile>, TestError> {
    self.inner.get_file(rid).await
  }
}

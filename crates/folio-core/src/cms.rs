//! [`Cms`] — the write pipeline wrapping a [`RecordStore`].
//!
//! Reads pass straight through. Writes trigger cache revalidation, and
//! deletes run the collection's registered delete hooks around the store
//! delete. Hook failures are logged and never fail the delete itself.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
  Error, Result,
  cleanup::{CleanupReport, cleanup_references},
  hooks::{DeleteEvent, HookPhase, HookRegistry, WriteContext},
  record::{NewRecord, Record, RecordId, validate_collection},
  revalidate::{Revalidation, Revalidator, TracingRevalidator},
  store::{FindQuery, RecordStore},
};

/// Result of [`Cms::delete`].
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
  /// The record as it was just before deletion.
  pub record:  Record,
  /// One report per relationship watch whose scan succeeded.
  pub cleanup: Vec<CleanupReport>,
}

pub struct Cms<S> {
  store:       Arc<S>,
  hooks:       HookRegistry,
  revalidator: Arc<dyn Revalidator>,
}

impl<S> Clone for Cms<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      hooks:       self.hooks.clone(),
      revalidator: Arc::clone(&self.revalidator),
    }
  }
}

impl<S: RecordStore> Cms<S> {
  /// A pipeline with the site's default hooks and log-only revalidation.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      hooks: HookRegistry::site_defaults(),
      revalidator: Arc::new(TracingRevalidator),
    }
  }

  pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
    self.hooks = hooks;
    self
  }

  pub fn with_revalidator(mut self, revalidator: Arc<dyn Revalidator>) -> Self {
    self.revalidator = revalidator;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
    validate_collection(collection)?;
    self.store.find(collection, query).await.map_err(Error::store)
  }

  pub async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Record>> {
    validate_collection(collection)?;
    self.store.get(collection, id).await.map_err(Error::store)
  }

  async fn require(&self, collection: &str, id: &RecordId) -> Result<Record> {
    self.get(collection, id).await?.ok_or_else(|| Error::NotFound {
      collection: collection.to_owned(),
      id:         id.clone(),
    })
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn create(
    &self,
    collection: &str,
    input:      NewRecord,
    ctx:        WriteContext,
  ) -> Result<Record> {
    validate_collection(collection)?;
    let record = self.store.create(collection, input).await.map_err(Error::store)?;
    self.revalidate(&record, ctx);
    Ok(record)
  }

  pub async fn update(
    &self,
    collection: &str,
    id:         &RecordId,
    partial:    Map<String, Value>,
    ctx:        WriteContext,
  ) -> Result<Record> {
    self.require(collection, id).await?;
    let record = self
      .store
      .update(collection, id, partial)
      .await
      .map_err(Error::store)?;
    self.revalidate(&record, ctx);
    Ok(record)
  }

  /// Delete a record, scrubbing references to it from related records.
  ///
  /// Only a missing record or a failing store delete is an error; reference
  /// cleanup problems are logged and the delete goes ahead.
  pub async fn delete(
    &self,
    collection: &str,
    id:         &RecordId,
    ctx:        WriteContext,
  ) -> Result<DeleteOutcome> {
    let record = self.require(collection, id).await?;
    let event = DeleteEvent { collection, record_id: id };

    let mut cleanup = self.run_delete_hooks(&event, HookPhase::BeforeDelete).await;

    let deleted = self.store.delete(collection, id).await.map_err(Error::store)?;
    if !deleted {
      return Err(Error::NotFound { collection: collection.to_owned(), id: id.clone() });
    }
    info!(%collection, %id, "deleted record");

    cleanup.extend(self.run_delete_hooks(&event, HookPhase::AfterDelete).await);
    self.revalidate(&record, ctx);

    Ok(DeleteOutcome { record, cleanup })
  }

  async fn run_delete_hooks(
    &self,
    event: &DeleteEvent<'_>,
    phase: HookPhase,
  ) -> Vec<CleanupReport> {
    let mut reports = Vec::new();
    for watch in self.hooks.watches(event.collection, phase) {
      match cleanup_references(self.store.as_ref(), watch, event.record_id).await {
        Ok(report) => {
          if report.failed > 0 {
            warn!(
              collection = %event.collection,
              id = %event.record_id,
              field = %watch.field,
              failed = report.failed,
              "reference cleanup left records unchanged after errors",
            );
          }
          reports.push(report);
        }
        Err(e) => warn!(
          collection = %event.collection,
          id = %event.record_id,
          ?phase,
          error = %e,
          "reference cleanup aborted; delete proceeds",
        ),
      }
    }
    reports
  }

  fn revalidate(&self, record: &Record, ctx: WriteContext) {
    if ctx.disable_revalidate {
      return;
    }
    self.revalidator.revalidate(&Revalidation::for_record(record));
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use serde_json::json;

  use super::*;
  use crate::{
    cleanup::RelationshipWatch,
    hooks::DeleteHook,
    testing::{FailingStore, MemoryStore, id},
  };

  #[derive(Default)]
  struct Recorder(Mutex<Vec<Revalidation>>);

  impl Revalidator for Recorder {
    fn revalidate(&self, revalidation: &Revalidation) {
      self.0.lock().unwrap().push(revalidation.clone());
    }
  }

  fn products() -> MemoryStore {
    let store = MemoryStore::default();
    store.insert("products", "A", json!({"slug": "a", "relatedProducts": ["B", "C"]}));
    store.insert("products", "B", json!({"slug": "b", "relatedProducts": [{"id": "A"}, "C"]}));
    store.insert("products", "C", json!({"slug": "c", "relatedProducts": []}));
    store
  }

  #[tokio::test]
  async fn delete_scrubs_related_products() {
    let cms = Cms::new(Arc::new(products()));

    let outcome = cms.delete("products", &id("B"), WriteContext::default()).await.unwrap();

    assert_eq!(outcome.record.id, id("B"));
    assert_eq!(outcome.cleanup.len(), 1);
    assert_eq!(outcome.cleanup[0].updated, 1);
    assert_eq!(cms.store().field("products", "A", "relatedProducts"), json!(["C"]));
    assert!(cms.get("products", &id("B")).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn scan_failure_does_not_block_delete() {
    let cms = Cms::new(Arc::new(FailingStore::scans(products())));

    let outcome = cms.delete("products", &id("B"), WriteContext::default()).await.unwrap();

    assert!(outcome.cleanup.is_empty());
    assert_eq!(cms.store().inner.count("products"), 2);
    // The dangling reference survives; cleanup is best effort.
    assert_eq!(cms.store().inner.field("products", "A", "relatedProducts"), json!(["B", "C"]));
  }

  #[tokio::test]
  async fn after_hooks_run_once_record_is_gone() {
    let store = MemoryStore::default();
    store.insert("categories", "K", json!({"slug": "pumps"}));
    store.insert("posts", "P", json!({"categories": ["K", "L"]}));
    store.insert("products", "Q", json!({"categories": [{"value": "K"}]}));
    let cms = Cms::new(Arc::new(store));

    let outcome = cms.delete("categories", &id("K"), WriteContext::default()).await.unwrap();

    assert_eq!(outcome.cleanup.len(), 2);
    assert_eq!(cms.store().field("posts", "P", "categories"), json!(["L"]));
    assert_eq!(cms.store().field("products", "Q", "categories"), json!([]));
  }

  #[tokio::test]
  async fn deleting_missing_record_is_not_found() {
    let cms = Cms::new(Arc::new(products()));
    let err = cms.delete("products", &id("Z"), WriteContext::default()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
  }

  #[tokio::test]
  async fn custom_hooks_replace_defaults() {
    let mut hooks = HookRegistry::new();
    hooks.register(
      "products",
      DeleteHook::after([RelationshipWatch::new("products", "accessories")]),
    );
    let store = products();
    store.insert("products", "D", json!({"accessories": ["B"]}));
    let cms = Cms::new(Arc::new(store)).with_hooks(hooks);

    cms.delete("products", &id("B"), WriteContext::default()).await.unwrap();

    assert_eq!(cms.store().field("products", "D", "accessories"), json!([]));
    assert_eq!(cms.store().field("products", "A", "relatedProducts"), json!(["B", "C"]));
  }

  #[tokio::test]
  async fn writes_revalidate_unless_disabled() {
    let recorder = Arc::new(Recorder::default());
    let cms = Cms::new(Arc::new(products())).with_revalidator(recorder.clone());

    let mut data = Map::new();
    data.insert("slug".into(), json!("d"));
    cms.create("products", NewRecord::new(data.clone()), WriteContext::quiet()).await.unwrap();
    assert!(recorder.0.lock().unwrap().is_empty());

    cms.create("products", NewRecord::new(data), WriteContext::default()).await.unwrap();
    cms.delete("products", &id("C"), WriteContext::default()).await.unwrap();

    let seen = recorder.0.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].paths, ["/products/c", "/products"]);
  }

  #[tokio::test]
  async fn update_requires_existing_record() {
    let cms = Cms::new(Arc::new(products()));
    let mut partial = Map::new();
    partial.insert("title".into(), json!("Pump"));

    let updated = cms.update("products", &id("A"), partial.clone(), WriteContext::quiet()).await.unwrap();
    assert_eq!(updated.data["title"], "Pump");
    assert_eq!(updated.data["slug"], "a");

    let err = cms.update("products", &id("Z"), partial, WriteContext::quiet()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
  }

  #[tokio::test]
  async fn rejects_bad_collection_slugs() {
    let cms = Cms::new(Arc::new(products()));
    let err = cms.find("pro ducts", &FindQuery::all()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidCollection(_)));
  }
}

//! Delete-hook registration.
//!
//! Each collection declares which relationship fields must be scrubbed when
//! one of its records is deleted, and whether that happens before or after
//! the record itself is removed. The wiring is explicit per collection; the
//! registry never inspects record data to discover relationships.

use std::collections::HashMap;

use serde::Serialize;

use crate::{cleanup::RelationshipWatch, record::RecordId};

/// When a delete hook runs relative to the store delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
  BeforeDelete,
  AfterDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteHook {
  pub phase:   HookPhase,
  pub watches: Vec<RelationshipWatch>,
}

impl DeleteHook {
  pub fn before(watches: impl IntoIterator<Item = RelationshipWatch>) -> Self {
    Self { phase: HookPhase::BeforeDelete, watches: watches.into_iter().collect() }
  }

  pub fn after(watches: impl IntoIterator<Item = RelationshipWatch>) -> Self {
    Self { phase: HookPhase::AfterDelete, watches: watches.into_iter().collect() }
  }
}

/// Per-request flags threaded through writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteContext {
  /// Skip cache revalidation (bulk seeding).
  pub disable_revalidate: bool,
}

impl WriteContext {
  pub fn quiet() -> Self { Self { disable_revalidate: true } }
}

/// The record being deleted, as handed to each hook.
#[derive(Debug, Clone, Copy)]
pub struct DeleteEvent<'a> {
  pub collection: &'a str,
  pub record_id:  &'a RecordId,
}

/// Collection slug → delete hooks.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
  hooks: HashMap<String, Vec<DeleteHook>>,
}

impl HookRegistry {
  pub fn new() -> Self { Self::default() }

  /// The relationships of the corporate site's collections.
  pub fn site_defaults() -> Self {
    let mut registry = Self::new();
    registry
      .register(
        "products",
        DeleteHook::before([RelationshipWatch::new("products", "relatedProducts")]),
      )
      .register(
        "tools",
        DeleteHook::after([RelationshipWatch::new("tools", "relatedTools")]),
      )
      .register(
        "posts",
        DeleteHook::before([RelationshipWatch::new("posts", "relatedPosts")]),
      )
      .register(
        "projects",
        DeleteHook::before([RelationshipWatch::new("projects", "relatedProjects")]),
      )
      .register(
        "categories",
        DeleteHook::after([
          RelationshipWatch::new("posts", "categories"),
          RelationshipWatch::new("products", "categories"),
        ]),
      );
    registry
  }

  pub fn register(&mut self, collection: impl Into<String>, hook: DeleteHook) -> &mut Self {
    self.hooks.entry(collection.into()).or_default().push(hook);
    self
  }

  /// Watches to run for `collection` in `phase`, in registration order.
  pub fn watches(&self, collection: &str, phase: HookPhase) -> Vec<&RelationshipWatch> {
    self
      .hooks
      .get(collection)
      .into_iter()
      .flatten()
      .filter(|h| h.phase == phase)
      .flat_map(|h| h.watches.iter())
      .collect()
  }
}

//! Idempotent seeding of collections at setup time.
//!
//! Items are keyed by slug: an item whose slug already exists is skipped
//! without touching the store or the filesystem. New items get their image
//! uploaded to the media collection first. A missing image falls back to the
//! configured default, and failing that the record is created without one.
//!
//! Uploads go through an [`UploadCache`] owned by the caller, so one seeding
//! run never uploads the same source file twice.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
  Result,
  cms::Cms,
  hooks::WriteContext,
  record::{FileUpload, NewRecord, RecordId},
  store::{FindQuery, RecordStore},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// One record to seed.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
  pub slug:  String,
  /// File name looked up in [`SeedOptions::search_paths`].
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub data:  Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
  pub collection:       String,
  pub media_collection: String,
  /// Field on the seeded record that receives the uploaded media ID.
  pub image_field:      String,
  pub search_paths:     Vec<PathBuf>,
  pub default_image:    Option<String>,
}

impl SeedOptions {
  pub fn new(collection: impl Into<String>) -> Self {
    Self {
      collection:       collection.into(),
      media_collection: "media".into(),
      image_field:      "featuredImage".into(),
      search_paths:     Vec::new(),
      default_image:    None,
    }
  }
}

// ─── Upload cache ────────────────────────────────────────────────────────────

/// Canonical source path → ID of the media record it was uploaded as.
#[derive(Debug, Default)]
pub struct UploadCache {
  uploads: HashMap<PathBuf, RecordId>,
}

impl UploadCache {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, path: &Path) -> Option<&RecordId> { self.uploads.get(path) }

  pub fn len(&self) -> usize { self.uploads.len() }

  pub fn is_empty(&self) -> bool { self.uploads.is_empty() }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
  Created { id: RecordId },
  Skipped,
  Failed { reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
  pub created:  usize,
  pub skipped:  usize,
  pub failed:   usize,
  /// Per-item outcomes, keyed by slug, in input order.
  pub outcomes: Vec<(String, SeedOutcome)>,
}

impl SeedReport {
  fn push(&mut self, slug: &str, outcome: SeedOutcome) {
    match outcome {
      SeedOutcome::Created { .. } => self.created += 1,
      SeedOutcome::Skipped => self.skipped += 1,
      SeedOutcome::Failed { .. } => self.failed += 1,
    }
    self.outcomes.push((slug.to_owned(), outcome));
  }
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// Seed `items` one after another and summarise the run.
pub async fn seed_batch<S>(
  cms:     &Cms<S>,
  options: &SeedOptions,
  items:   &[SeedItem],
  cache:   &mut UploadCache,
) -> SeedReport
where
  S: RecordStore,
{
  let mut report = SeedReport::default();
  for item in items {
    let outcome = seed_item(cms, options, item, cache).await;
    report.push(&item.slug, outcome);
  }
  info!(
    collection = %options.collection,
    created = report.created,
    skipped = report.skipped,
    failed = report.failed,
    "seeding finished",
  );
  report
}

/// Create `item` unless a record with its slug already exists.
pub async fn seed_item<S>(
  cms:     &Cms<S>,
  options: &SeedOptions,
  item:    &SeedItem,
  cache:   &mut UploadCache,
) -> SeedOutcome
where
  S: RecordStore,
{
  if item.slug.is_empty() {
    return SeedOutcome::Failed { reason: "empty slug".into() };
  }

  match cms.find(&options.collection, &FindQuery::slug(item.slug.clone())).await {
    Ok(existing) if !existing.is_empty() => {
      debug!(collection = %options.collection, slug = %item.slug, "already seeded");
      return SeedOutcome::Skipped;
    }
    Ok(_) => {}
    Err(e) => return SeedOutcome::Failed { reason: format!("existence check failed: {e}") },
  }

  let mut data = item.data.clone();
  data.insert("slug".into(), Value::String(item.slug.clone()));

  if let Some(media_id) = attach_image(cms, options, item, cache).await {
    data.insert(options.image_field.clone(), Value::String(media_id.to_string()));
  }

  match cms
    .create(&options.collection, NewRecord::new(data), WriteContext::quiet())
    .await
  {
    Ok(record) => {
      info!(collection = %options.collection, slug = %item.slug, id = %record.id, "seeded");
      SeedOutcome::Created { id: record.id }
    }
    Err(e) => {
      warn!(collection = %options.collection, slug = %item.slug, error = %e, "seed failed");
      SeedOutcome::Failed { reason: e.to_string() }
    }
  }
}

/// Upload the item's image (or the default) and return the media ID.
async fn attach_image<S>(
  cms:     &Cms<S>,
  options: &SeedOptions,
  item:    &SeedItem,
  cache:   &mut UploadCache,
) -> Option<RecordId>
where
  S: RecordStore,
{
  let wanted = item.image.as_deref()?;

  let path = match find_file(&options.search_paths, wanted).await {
    Some(path) => path,
    None => {
      let fallback = options.default_image.as_deref()?;
      warn!(slug = %item.slug, image = wanted, fallback, "image not found; using default");
      match find_file(&options.search_paths, fallback).await {
        Some(path) => path,
        None => {
          warn!(slug = %item.slug, "default image not found; seeding without image");
          return None;
        }
      }
    }
  };

  match upload_media(cms, &options.media_collection, &path, cache).await {
    Ok(id) => Some(id),
    Err(e) => {
      warn!(slug = %item.slug, path = %path.display(), error = %e, "image upload failed");
      None
    }
  }
}

/// First existing `dir/name` across `search_paths`.
async fn find_file(search_paths: &[PathBuf], name: &str) -> Option<PathBuf> {
  for dir in search_paths {
    let candidate = dir.join(name);
    if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
      return Some(candidate);
    }
  }
  None
}

/// Upload `path` to `media_collection` unless this run already did.
pub async fn upload_media<S>(
  cms:              &Cms<S>,
  media_collection: &str,
  path:             &Path,
  cache:            &mut UploadCache,
) -> Result<RecordId>
where
  S: RecordStore,
{
  let key = tokio::fs::canonicalize(path).await?;
  if let Some(id) = cache.get(&key) {
    return Ok(id.clone());
  }

  let bytes = tokio::fs::read(&key).await?;
  let filename = key
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "upload".into());
  let alt = key
    .file_stem()
    .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
    .unwrap_or_default();

  let mut data = Map::new();
  data.insert("alt".into(), Value::String(alt));

  let upload = FileUpload {
    mime_type: mime_for(&key).to_owned(),
    filename,
    bytes: Bytes::from(bytes),
  };
  let record = cms
    .create(media_collection, NewRecord::new(data).with_file(upload), WriteContext::quiet())
    .await?;

  cache.uploads.insert(key, record.id.clone());
  Ok(record.id)
}

fn mime_for(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "webp" => "image/webp",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "avif" => "image/avif",
    "pdf" => "application/pdf",
    _ => "application/octet-stream",
  }
}

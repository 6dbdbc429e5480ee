//! HTTP server and setup tooling for Folio.
//!
//! Wires a [`SqliteStore`](folio_store_sqlite::SqliteStore)-backed [`Cms`]
//! into the JSON API, and runs seed files against the same pipeline.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Router, routing::get};
use folio_core::{
  cms::Cms,
  seed::{SeedItem, SeedOptions, SeedReport, UploadCache, seed_batch},
  store::RecordStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `FOLIO_*`
/// environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub seed:       SeedConfig,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("folio.db") }

/// Where seeding looks for media files.
#[derive(Deserialize, Clone, Debug)]
pub struct SeedConfig {
  #[serde(default)]
  pub search_paths:     Vec<PathBuf>,
  #[serde(default)]
  pub default_image:    Option<String>,
  #[serde(default = "default_media_collection")]
  pub media_collection: String,
  #[serde(default = "default_image_field")]
  pub image_field:      String,
}

fn default_media_collection() -> String { "media".into() }

fn default_image_field() -> String { "featuredImage".into() }

impl Default for SeedConfig {
  fn default() -> Self {
    Self {
      search_paths:     Vec::new(),
      default_image:    None,
      media_collection: default_media_collection(),
      image_field:      default_image_field(),
    }
  }
}

impl SeedConfig {
  pub fn options(&self, collection: &str) -> SeedOptions {
    SeedOptions {
      collection:       collection.to_owned(),
      media_collection: self.media_collection.clone(),
      image_field:      self.image_field.clone(),
      search_paths:     self.search_paths.clone(),
      default_image:    self.default_image.clone(),
    }
  }
}

/// Layer `path` (optional) under `FOLIO_*` environment variables.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("FOLIO").prefix_separator("_").separator("__"))
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/health`, uploaded files under `/files` and the
/// JSON API under `/api`.
pub fn router<S>(cms: Arc<Cms<S>>) -> Router
where
  S: RecordStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .merge(folio_api::files_router(cms.clone()))
    .nest("/api", folio_api::api_router(cms))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Seeding ──────────────────────────────────────────────────────────────────

/// Shape of a seed file: one collection's worth of items.
#[derive(Deserialize, Debug)]
pub struct SeedFile {
  pub collection:    String,
  /// Overrides [`SeedConfig::default_image`] for this file.
  #[serde(default)]
  pub default_image: Option<String>,
  pub items:         Vec<SeedItem>,
}

impl SeedFile {
  pub async fn read(path: &Path) -> anyhow::Result<Self> {
    let raw = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read seed file {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {path:?}"))
  }
}

/// Seed every item of `file` with a fresh upload cache.
pub async fn run_seed<S>(cms: &Cms<S>, seed: &SeedConfig, file: &SeedFile) -> SeedReport
where
  S: RecordStore,
{
  let mut options = seed.options(&file.collection);
  if file.default_image.is_some() {
    options.default_image = file.default_image.clone();
  }
  let mut cache = UploadCache::new();
  seed_batch(cms, &options, &file.items, &mut cache).await
}

// ─── Integration tests ────────────────────────────────────────────────────────

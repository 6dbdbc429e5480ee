//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by a [`Cms`] over any
//! [`folio_core::store::RecordStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! Stored media records carry `url = "/files/{id}"`, so [`files_router`]
//! belongs at the site root while the record routes can live anywhere:
//!
//! ```rust,ignore
//! .merge(folio_api::files_router(cms.clone()))
//! .nest("/api", folio_api::api_router(cms))
//! ```

pub mod error;
pub mod etag;
pub mod files;
pub mod records;

use std::sync::Arc;

use axum::{Router, routing::get};
use folio_core::{cms::Cms, store::RecordStore};

pub use error::ApiError;

/// Build a fully-materialised record API router for `cms`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(cms: Arc<Cms<S>>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    .route("/{collection}", get(records::list::<S>).post(records::create::<S>))
    .route(
      "/{collection}/{id}",
      get(records::get_one::<S>)
        .patch(records::update_one::<S>)
        .delete(records::delete_one::<S>),
    )
    .with_state(cms)
}

/// `GET /files/{id}`, serving the bytes behind each media record's `url`.
pub fn files_router<S>(cms: Arc<Cms<S>>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new().route("/files/{id}", get(files::get_one::<S>)).with_state(cms)
}

// ─── Integration tests ────────────────────────────────────────────────────────

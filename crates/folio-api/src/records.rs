//! Handlers for `/{collection}` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{collection}` | Optional `?slug=` and `?limit=` |
//! | `POST`   | `/{collection}` | Body: [`CreateBody`]; returns 201 + stored record |
//! | `GET`    | `/{collection}/{id}` | 404 if not found; sets `ETag` |
//! | `PATCH`  | `/{collection}/{id}` | Body: JSON object merged into the record |
//! | `DELETE` | `/{collection}/{id}` | Runs delete hooks; returns [`DeleteOutcome`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use folio_core::{
  cms::{Cms, DeleteOutcome},
  hooks::WriteContext,
  record::{FileUpload, NewRecord, Record, RecordId},
  store::{Filter, FindQuery, RecordStore},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

fn record_id(id: String) -> Result<RecordId, ApiError> {
  RecordId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub slug:  Option<String>,
  pub limit: Option<usize>,
}

/// `GET /{collection}[?slug=<slug>][&limit=<n>]`
pub async fn list<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path(collection): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
{
  let query = FindQuery {
    filter: params
      .slug
      .map(|value| Filter::Equals { field: "slug".into(), value })
      .unwrap_or_default(),
    limit:  params.limit,
  };
  Ok(Json(cms.find(&collection, &query).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// An attached file, base64-encoded.
#[derive(Debug, Deserialize)]
pub struct FileBody {
  pub filename:  String,
  pub mime_type: String,
  pub base64:    String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub data: Map<String, Value>,
  pub file: Option<FileBody>,
}

/// `POST /{collection}`
pub async fn create<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path(collection): Path<String>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let mut input = NewRecord::new(body.data);
  if let Some(file) = body.file {
    let bytes = B64
      .decode(file.base64.as_bytes())
      .map_err(|e| ApiError::BadRequest(format!("invalid base64 file: {e}")))?;
    input = input.with_file(FileUpload {
      filename:  file.filename,
      mime_type: file.mime_type,
      bytes:     bytes.into(),
    });
  }

  let record = cms.create(&collection, input, WriteContext::default()).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{collection}/{id}` — honours `If-None-Match`.
pub async fn get_one<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path((collection, id)): Path<(String, String)>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let id = record_id(id)?;
  let record = cms
    .get(&collection, &id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id} not found")))?;

  let etag = compute_etag(&record);
  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| if_none_match(v, &etag));
  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(([(header::ETAG, etag)], Json(record)).into_response())
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /{collection}/{id}`
pub async fn update_one<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path((collection, id)): Path<(String, String)>,
  Json(partial): Json<Map<String, Value>>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  let id = record_id(id)?;
  let record = cms.update(&collection, &id, partial, WriteContext::default()).await?;
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /{collection}/{id}`
pub async fn delete_one<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path((collection, id)): Path<(String, String)>,
) -> Result<Json<DeleteOutcome>, ApiError>
where
  S: RecordStore,
{
  let id = record_id(id)?;
  let outcome = cms.delete(&collection, &id, WriteContext::default()).await?;
  Ok(Json(outcome))
}

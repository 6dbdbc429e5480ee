//! `GET /files/{id}` — raw bytes of an uploaded file.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use folio_core::{cms::Cms, record::RecordId, store::RecordStore};

use crate::error::ApiError;

pub async fn get_one<S>(
  State(cms): State<Arc<Cms<S>>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let id = RecordId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let file = cms
    .store()
    .get_file(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;

  let disposition = format!("inline; filename=\"{}\"", file.filename.replace('"', ""));
  Ok((
    [(header::CONTENT_TYPE, file.mime_type), (header::CONTENT_DISPOSITION, disposition)],
    file.bytes,
  ))
}

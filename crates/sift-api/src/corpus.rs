//! Read-only corpus endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/overview` | Headline counts |
//! | `GET`  | `/datasets` | Per-dataset breakdown |
//! | `GET`  | `/distributions` | File size and text length buckets |
//! | `GET`  | `/files` | `?dataset=&filename=&status=&limit=` |
//! | `GET`  | `/files/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use sift_core::{
  corpus::{DatasetSummary, Distributions, Document, File, FileQuery, Overview, TextStatus},
  store::CorpusStore,
};

use crate::{ApiState, error::ApiError};

/// `GET /overview`
pub async fn overview<S: CorpusStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Overview>, ApiError> {
  let overview = state.store.overview().await.map_err(ApiError::store)?;
  Ok(Json(overview))
}

/// `GET /datasets`
pub async fn datasets<S: CorpusStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<DatasetSummary>>, ApiError> {
  let rows = state.store.dataset_breakdown().await.map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /distributions`
pub async fn distributions<S: CorpusStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Distributions>, ApiError> {
  let dist = state.store.distributions().await.map_err(ApiError::store)?;
  Ok(Json(dist))
}

// ─── Files ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub dataset:  Option<i64>,
  /// Case-insensitive filename substring.
  pub filename: Option<String>,
  #[serde(default)]
  pub status:   TextStatus,
  pub limit:    Option<usize>,
}

/// `GET /files[?dataset=..][&filename=..][&status=has_text|needs_ocr|no_text][&limit=..]`
pub async fn list<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<File>>, ApiError> {
  let query = FileQuery {
    dataset:  params.dataset,
    filename: params.filename,
    status:   params.status,
    limit:    params.limit.unwrap_or(FileQuery::default().limit),
  };
  let files = state.store.list_files(&query).await.map_err(ApiError::store)?;
  Ok(Json(files))
}

/// `GET /files/{id}`
pub async fn get_one<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Document>, ApiError> {
  let doc = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;
  Ok(Json(doc))
}

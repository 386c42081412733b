//! Keyword index endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/keywords` | Stored totals plus the registry, `?min_matches=` |
//! | `POST` | `/keywords` | Body: `{"keywords":["..."]}` or `{"all":true}` |
//! | `GET`  | `/keywords/{keyword}` | Top files for one keyword, `?limit=` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use sift_core::{
  keyword::{IndexReport, KeywordHit, KeywordTotal},
  store::CorpusStore,
};

use crate::{ApiState, error::ApiError};

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
  #[serde(default = "default_min_matches")]
  pub min_matches: i64,
}

fn default_min_matches() -> i64 { 1 }

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub summary:  Vec<KeywordTotal>,
  /// Defaults followed by runtime additions.
  pub registry: Vec<String>,
  pub custom:   Vec<String>,
}

/// `GET /keywords[?min_matches=N]`
pub async fn summary<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
  let summary = state
    .store
    .keyword_summary(params.min_matches)
    .await
    .map_err(ApiError::store)?;
  let registry = state.registry.lock().await;
  Ok(Json(SummaryResponse {
    summary,
    registry: registry.all(),
    custom: registry.custom().to_vec(),
  }))
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct IndexBody {
  #[serde(default)]
  pub keywords: Vec<String>,
  /// Re-index every registry keyword instead of `keywords`.
  #[serde(default)]
  pub all:      bool,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
  #[serde(flatten)]
  pub report:     IndexReport,
  /// Keywords newly appended to the registry file.
  pub registered: Vec<String>,
}

/// `POST /keywords`
///
/// The registry lock is held for the whole run so concurrent requests
/// append in commit order.
pub async fn index<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<IndexBody>,
) -> Result<Json<IndexResponse>, ApiError> {
  let mut registry = state.registry.lock().await;
  let keywords = if body.all { registry.all() } else { body.keywords };
  if keywords.iter().all(|k| k.trim().is_empty()) {
    return Err(ApiError::BadRequest("no keywords to index".into()));
  }

  let report = state
    .store
    .index_keywords(keywords)
    .await
    .map_err(ApiError::store)?;

  let indexed: Vec<&str> = report.keywords.iter().map(|k| k.keyword.as_str()).collect();
  let registered = registry.append_new(&indexed).map_err(ApiError::store)?;
  if !registered.is_empty() {
    tracing::info!(count = registered.len(), path = ?registry.path(), "registry updated");
  }

  Ok(Json(IndexResponse { report, registered }))
}

// ─── Hits ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HitsParams {
  #[serde(default = "default_hits_limit")]
  pub limit: usize,
}

fn default_hits_limit() -> usize { 100 }

/// `GET /keywords/{keyword}[?limit=N]`
pub async fn hits<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Path(keyword): Path<String>,
  Query(params): Query<HitsParams>,
) -> Result<Json<Vec<KeywordHit>>, ApiError> {
  let hits = state
    .store
    .keyword_hits(keyword, params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(hits))
}

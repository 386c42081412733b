//! Handlers for `GET /search` and `GET /search/stream`.
//!
//! Both run the same unindexed substring scan. `/search` waits for the full
//! result set; `/search/stream` answers with NDJSON, one `progress` line per
//! batch followed by a terminating `done` (or `error`) line.

use axum::{
  Json,
  body::Body,
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use sift_core::{
  search::{SearchProgress, SearchStream, TextHit, TextQuery},
  store::CorpusStore,
};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  /// Case-insensitive literal substring.
  #[serde(default)]
  pub term: String,
  /// Maximum hits; defaults to the configured cap.
  pub cap:  Option<usize>,
}

fn text_query<S: CorpusStore>(state: &ApiState<S>, params: SearchParams) -> TextQuery {
  TextQuery {
    term:       params.term,
    cap:        params.cap.unwrap_or(state.config.search_cap),
    batch_size: state.config.search_batch_size,
  }
}

/// `GET /search?term=..[&cap=N]`
pub async fn collected<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TextHit>>, ApiError> {
  let query = text_query(&state, params);
  let hits = state
    .store
    .search_text(query)
    .await
    .map_err(ApiError::store)?
    .collect()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(hits))
}

// ─── Streaming ───────────────────────────────────────────────────────────────

/// One NDJSON line of `/search/stream`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamLine {
  Progress(SearchProgress),
  Done { found: usize },
  Error { error: String },
}

fn ndjson(line: &StreamLine) -> Result<String, serde_json::Error> {
  let mut out = serde_json::to_string(line)?;
  out.push('\n');
  Ok(out)
}

/// `GET /search/stream?term=..[&cap=N]`
///
/// Closing the connection drops the stream, which stops the scan.
pub async fn stream<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
  let query = text_query(&state, params);
  let results: SearchStream<S::Error> =
    state.store.search_text(query).await.map_err(ApiError::store)?;

  let lines = stream::unfold(Some(results), |pending| async move {
    let mut results = pending?;
    let (line, next) = match results.next().await {
      Some(Ok(progress)) => (StreamLine::Progress(progress), Some(results)),
      Some(Err(e)) => {
        tracing::warn!("search stream failed: {e}");
        (StreamLine::Error { error: e.to_string() }, None)
      }
      None => (StreamLine::Done { found: results.found_so_far() }, None),
    };
    Some((ndjson(&line), next))
  });

  Ok(
    (
      [(header::CONTENT_TYPE, "application/x-ndjson")],
      Body::from_stream(lines),
    )
      .into_response(),
  )
}

//! Handler for `POST /anchor`.
//!
//! Body:
//!
//! ```json
//! {
//!   "terms": ["Steve Bannon", "Stephen Bannon"],
//!   "exclude": ["bannon"],
//!   "limit": 30,
//!   "categories": [{"name": "Media", "terms": ["breitbart", "podcast"]}]
//! }
//! ```
//!
//! `exclude` defaults to the terms themselves; `categories` is optional.

use axum::{
  Json,
  extract::State,
};
use serde::{Deserialize, Serialize};
use sift_core::{
  anchor::{Anchor, AnchorQuery, AnchorReport, Category, CategoryCount},
  capability::Capability,
  store::CorpusStore,
};

use crate::{
  ApiState,
  error::{ApiError, Degraded},
};

#[derive(Debug, Deserialize)]
pub struct AnchorBody {
  pub terms:      Vec<String>,
  pub exclude:    Option<Vec<String>>,
  pub limit:      Option<usize>,
  #[serde(default)]
  pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct AnchorResponse {
  #[serde(flatten)]
  pub report:     AnchorReport,
  pub categories: Vec<CategoryCount>,
}

/// `POST /anchor`
pub async fn handler<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<AnchorBody>,
) -> Result<Degraded<Json<AnchorResponse>>, ApiError> {
  let anchor = Anchor::new(body.terms);
  if anchor.is_empty() {
    return Err(ApiError::BadRequest("at least one anchor term is required".into()));
  }

  let mut query = AnchorQuery::new(anchor);
  query.exclude = body.exclude;
  if let Some(limit) = body.limit {
    query.limit = limit;
  }

  let report = state.store.anchor_query(&query).await.map_err(ApiError::store)?;
  let categories = if body.categories.is_empty() {
    Vec::new()
  } else {
    state
      .store
      .category_counts(&query.anchor, &body.categories)
      .await
      .map_err(ApiError::store)?
  };

  let available = report.entities_available;
  let response = Json(AnchorResponse { report, categories });
  Ok(if available {
    Degraded::ok(response)
  } else {
    Degraded::warn(sift_core::Error::CapabilityUnavailable(Capability::Entities).to_string(), response)
  })
}

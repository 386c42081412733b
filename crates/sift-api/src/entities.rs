//! Entity, co-occurrence and graph endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/capabilities` | Which optional tables hold data |
//! | `GET`  | `/entities` | `?q=&limit=` substring search over mentions |
//! | `GET`  | `/entities/top` | `?label=PERSON&limit=` |
//! | `POST` | `/cooccurrence` | Rebuild the co-occurrence table, `?max_entities=` |
//! | `GET`  | `/graph` | `?min_shared_files=&max_nodes=&types=&priority=` |
//!
//! When the backing data is missing these answer with an empty body and a
//! `Warning` header rather than an error.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use sift_core::{
  capability::{Capabilities, Capability},
  entity::{CooccurrenceReport, EntityLabel, EntityMention, EntitySummary},
  graph::{Graph, GraphParams},
  store::CorpusStore,
};

use crate::{
  ApiState,
  error::{ApiError, Degraded, probe},
};

/// `GET /capabilities`
pub async fn capabilities<S: CorpusStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Capabilities>, ApiError> {
  let caps = state.store.capabilities().await.map_err(ApiError::store)?;
  Ok(Json(caps))
}

// ─── Entity views ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q:     String,
  #[serde(default = "default_search_limit")]
  pub limit: usize,
}

fn default_search_limit() -> usize { 100 }

/// `GET /entities?q=..[&limit=N]`
pub async fn search<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Degraded<Json<Vec<EntityMention>>>, ApiError> {
  if let Err(e) = probe(&*state.store, &[Capability::Entities]).await? {
    return Ok(Degraded::warn(e.to_string(), Json(Vec::new())));
  }
  let q = params.q.trim();
  if q.is_empty() {
    return Ok(Degraded::ok(Json(Vec::new())));
  }
  let rows = state
    .store
    .entity_search(q.to_owned(), params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Degraded::ok(Json(rows)))
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
  pub label: Option<String>,
  #[serde(default = "default_top_limit")]
  pub limit: usize,
}

fn default_top_limit() -> usize { 50 }

/// `GET /entities/top[?label=ORG][&limit=N]`
pub async fn top<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<TopParams>,
) -> Result<Degraded<Json<Vec<EntitySummary>>>, ApiError> {
  if let Err(e) = probe(&*state.store, &[Capability::Entities]).await? {
    return Ok(Degraded::warn(e.to_string(), Json(Vec::new())));
  }
  let label = params.label.map(EntityLabel::from).unwrap_or(EntityLabel::Person);
  let rows = state
    .store
    .top_entities(label, params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Degraded::ok(Json(rows)))
}

// ─── Co-occurrence ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct AggregateParams {
  pub max_entities: Option<usize>,
}

/// `POST /cooccurrence[?max_entities=N]`
pub async fn aggregate<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<AggregateParams>,
) -> Result<Degraded<Json<CooccurrenceReport>>, ApiError> {
  if let Err(e) = probe(&*state.store, &[Capability::Entities]).await? {
    return Ok(Degraded::warn(e.to_string(), Json(CooccurrenceReport::default())));
  }
  let max = params.max_entities.unwrap_or(state.config.max_entities_per_document);
  let report = state
    .store
    .aggregate_cooccurrence(max)
    .await
    .map_err(ApiError::store)?;
  Ok(Degraded::ok(Json(report)))
}

// ─── Graph ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct GraphQuery {
  pub min_shared_files: Option<i64>,
  pub max_nodes:        Option<usize>,
  /// Comma-separated entity labels, e.g. `PERSON,ORG`.
  pub types:            Option<String>,
  /// Comma-separated normalized names; replaces the configured set.
  pub priority:         Option<String>,
}

fn split(list: &str) -> impl Iterator<Item = &str> {
  list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl GraphQuery {
  /// Overlay the query on the configured defaults.
  pub fn apply(self, mut params: GraphParams) -> GraphParams {
    if let Some(n) = self.min_shared_files {
      params.min_shared_files = n;
    }
    if let Some(n) = self.max_nodes {
      params.max_nodes = n;
    }
    if let Some(types) = self.types {
      params.include_types = split(&types).map(EntityLabel::from).collect();
    }
    if let Some(priority) = self.priority {
      params.priority = split(&priority).map(str::to_ascii_lowercase).collect();
    }
    params
  }
}

/// `GET /graph`
pub async fn graph<S: CorpusStore>(
  State(state): State<ApiState<S>>,
  Query(query): Query<GraphQuery>,
) -> Result<Degraded<Json<Graph>>, ApiError> {
  let required = [Capability::Entities, Capability::Cooccurrence];
  if let Err(e) = probe(&*state.store, &required).await? {
    return Ok(Degraded::warn(e.to_string(), Json(Graph::default())));
  }
  let params = query.apply(state.config.graph.clone());
  let graph = state.store.build_graph(&params).await.map_err(ApiError::store)?;
  Ok(Degraded::ok(Json(graph)))
}

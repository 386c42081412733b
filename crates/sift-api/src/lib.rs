//! JSON query API for sift.
//!
//! Exposes an axum [`Router`] backed by any [`sift_core::store::CorpusStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sift_api::api_router(state))
//! ```

pub mod anchor;
pub mod corpus;
pub mod entities;
pub mod error;
pub mod keywords;
pub mod search;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use sift_core::{graph::GraphParams, registry::KeywordRegistry, store::CorpusStore};
use tokio::sync::Mutex;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Request defaults applied when a query leaves a parameter out.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub search_cap:                usize,
  pub search_batch_size:         usize,
  pub max_entities_per_document: usize,
  pub graph:                     GraphParams,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      search_cap:                200,
      search_batch_size:         10,
      max_entities_per_document: 400,
      graph:                     GraphParams::default(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct ApiState<S: CorpusStore> {
  pub store:    Arc<S>,
  pub registry: Arc<Mutex<KeywordRegistry>>,
  pub config:   Arc<ApiConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CorpusStore + Clone + 'static,
{
  Router::new()
    // Corpus
    .route("/overview", get(corpus::overview::<S>))
    .route("/datasets", get(corpus::datasets::<S>))
    .route("/distributions", get(corpus::distributions::<S>))
    .route("/files", get(corpus::list::<S>))
    .route("/files/{id}", get(corpus::get_one::<S>))
    // Keywords
    .route("/keywords", get(keywords::summary::<S>).post(keywords::index::<S>))
    .route("/keywords/{keyword}", get(keywords::hits::<S>))
    // Search
    .route("/search", get(search::collected::<S>))
    .route("/search/stream", get(search::stream::<S>))
    // Anchors
    .route("/anchor", post(anchor::handler::<S>))
    // Entities
    .route("/capabilities", get(entities::capabilities::<S>))
    .route("/entities", get(entities::search::<S>))
    .route("/entities/top", get(entities::top::<S>))
    .route("/cooccurrence", post(entities::aggregate::<S>))
    .route("/graph", get(entities::graph::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;

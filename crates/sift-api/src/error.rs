//! API error type, degraded responses, and their
//! [`axum::response::IntoResponse`] implementations.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use sift_core::{capability::Capability, store::CorpusStore};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

// ─── Degradation ─────────────────────────────────────────────────────────────

/// A successful response that may carry a `Warning: 199` header describing a
/// feature the store could not serve.
pub struct Degraded<T> {
  pub warning: Option<String>,
  pub body:    T,
}

impl<T> Degraded<T> {
  pub fn ok(body: T) -> Self { Self { warning: None, body } }

  pub fn warn(warning: impl Into<String>, body: T) -> Self {
    let warning = warning.into();
    tracing::warn!("{warning}");
    Self { warning: Some(warning), body }
  }
}

impl<T: IntoResponse> IntoResponse for Degraded<T> {
  fn into_response(self) -> Response {
    match self.warning {
      Some(w) => {
        let value = format!("199 sift \"{}\"", w.replace('"', "'"));
        ([(header::WARNING, value)], self.body).into_response()
      }
      None => self.body.into_response(),
    }
  }
}

/// Probe the store. The inner `Err` names the first of `required` it lacks.
pub async fn probe<S: CorpusStore>(
  store: &S,
  required: &[Capability],
) -> Result<sift_core::Result<()>, ApiError> {
  let caps = store.capabilities().await.map_err(ApiError::store)?;
  Ok(required.iter().try_for_each(|c| caps.require(*c)))
}

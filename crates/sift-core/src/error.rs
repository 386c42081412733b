//! Error types for `sift-core`.

use thiserror::Error;

use crate::capability::Capability;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} data is not available")]
  CapabilityUnavailable(Capability),

  #[error("keyword registry error: {0}")]
  Registry(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

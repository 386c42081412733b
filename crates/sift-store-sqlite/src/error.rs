//! Error type for `sift-store-sqlite`.

use sift_core::capability::Capability;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The optional table backing this feature is absent or empty.
  #[error("{0} data is not available")]
  CapabilityUnavailable(Capability),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

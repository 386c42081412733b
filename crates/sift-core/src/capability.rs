//! Optional data probed at runtime.
//!
//! Entity mentions and co-occurrence edges are produced by passes outside
//! this engine and may be missing. Callers inspect [`Capabilities`] and
//! disable the affected views instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A feature backed by optional tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  Entities,
  Cooccurrence,
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Entities => "entity",
      Self::Cooccurrence => "co-occurrence",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
  pub mentions: i64,
  pub unique:   i64,
  pub files:    i64,
}

/// Result of the schema probe. `None` means the table is absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
  pub schema_version: i64,
  pub entities:       Option<EntityStats>,
  /// Number of stored co-occurrence edges.
  pub cooccurrence:   Option<i64>,
}

impl Capabilities {
  pub fn has(&self, capability: Capability) -> bool {
    match capability {
      Capability::Entities => self.entities.is_some(),
      Capability::Cooccurrence => self.cooccurrence.is_some(),
    }
  }

  /// `Err(CapabilityUnavailable)` unless `capability` is present.
  pub fn require(&self, capability: Capability) -> crate::Result<()> {
    if self.has(capability) {
      Ok(())
    } else {
      Err(crate::Error::CapabilityUnavailable(capability))
    }
  }
}

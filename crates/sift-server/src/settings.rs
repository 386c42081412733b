//! Runtime settings, deserialised from `sift.toml` and `SIFT_*` variables.
//!
//! Every field has a default, so an absent config file is valid. Nested
//! keys are set from the environment with a double underscore, e.g.
//! `SIFT_SEARCH__CAP=500`.

use std::{
  collections::BTreeSet,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use sift_api::ApiConfig;
use sift_core::{entity::EntityLabel, graph::GraphParams};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:       PathBuf,
  pub host:             String,
  pub port:             u16,
  /// Append-only registry of keywords added at runtime.
  pub keywords_file:    PathBuf,
  pub default_keywords: Vec<String>,
  pub search:           SearchSettings,
  pub cooccurrence:     CooccurrenceSettings,
  pub graph:            GraphSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:       PathBuf::from("corpus.db"),
      host:             "127.0.0.1".to_string(),
      port:             8377,
      keywords_file:    PathBuf::from("custom_keywords.txt"),
      default_keywords: Vec::new(),
      search:           SearchSettings::default(),
      cooccurrence:     CooccurrenceSettings::default(),
      graph:            GraphSettings::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
  pub cap:        usize,
  pub batch_size: usize,
}

impl Default for SearchSettings {
  fn default() -> Self { Self { cap: 200, batch_size: 10 } }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CooccurrenceSettings {
  /// Documents naming more distinct entities than this are skipped.
  pub max_entities_per_document: usize,
}

impl Default for CooccurrenceSettings {
  fn default() -> Self { Self { max_entities_per_document: 400 } }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
  pub min_shared_files: i64,
  pub max_nodes:        usize,
  pub include_types:    Vec<String>,
  pub priority:         Vec<String>,
  pub central:          Vec<String>,
}

impl Default for GraphSettings {
  fn default() -> Self {
    let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
    Self {
      min_shared_files: 3,
      max_nodes:        100,
      include_types:    names(&["PERSON", "ORG"]),
      priority:         names(&[
        "jeffrey epstein",
        "ghislaine maxwell",
        "donald trump",
        "donald j. trump",
        "bill clinton",
        "prince andrew",
        "alan dershowitz",
        "les wexner",
        "jean-luc brunel",
        "virginia roberts",
        "virginia giuffre",
      ]),
      central:          names(&["jeffrey epstein", "epstein", "jeffrey"]),
    }
  }
}

impl GraphSettings {
  pub fn params(&self) -> GraphParams {
    let lower = |list: &[String]| -> BTreeSet<String> {
      list.iter().map(|s| s.trim().to_ascii_lowercase()).filter(|s| !s.is_empty()).collect()
    };
    GraphParams {
      min_shared_files: self.min_shared_files,
      max_nodes:        self.max_nodes,
      include_types:    self.include_types.iter().map(|t| EntityLabel::from(t.as_str())).collect(),
      priority:         lower(&self.priority),
      central:          lower(&self.central),
    }
  }
}

impl Settings {
  /// Layer the optional TOML file under `SIFT_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with(path, environment())
  }

  fn load_with(path: &Path, env: config::Environment) -> Result<Self, config::ConfigError> {
    let mut settings: Settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()?;
    settings.store_path = expand_tilde(&settings.store_path);
    settings.keywords_file = expand_tilde(&settings.keywords_file);
    Ok(settings)
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      search_cap:                self.search.cap,
      search_batch_size:         self.search.batch_size,
      max_entities_per_document: self.cooccurrence.max_entities_per_document,
      graph:                     self.graph.params(),
    }
  }
}

/// `SIFT_PORT`, `SIFT_SEARCH__CAP`, ...: one underscore after the prefix,
/// two between nested keys.
fn environment() -> config::Environment {
  config::Environment::with_prefix("SIFT")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

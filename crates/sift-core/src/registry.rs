//! Append-only keyword registry.
//!
//! A newline-delimited file listing keywords operators have indexed, merged
//! with the configured defaults at startup. The registry is advisory: the
//! authoritative match data lives in the store.

use std::{
  fs::OpenOptions,
  io::{ErrorKind, Write as _},
  path::{Path, PathBuf},
};

use crate::Result;

#[derive(Debug, Clone)]
pub struct KeywordRegistry {
  path:     PathBuf,
  defaults: Vec<String>,
  custom:   Vec<String>,
}

impl KeywordRegistry {
  /// Read `path` (a missing file is an empty registry) and merge it with
  /// `defaults`.
  pub fn load(path: impl AsRef<Path>, defaults: Vec<String>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let custom = match std::fs::read_to_string(&path) {
      Ok(raw) => raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect(),
      Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
      Err(e) => return Err(e.into()),
    };
    Ok(Self { path, defaults, custom })
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Keywords appended at runtime, in file order.
  pub fn custom(&self) -> &[String] { &self.custom }

  /// Defaults followed by custom keywords, without duplicates.
  pub fn all(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for kw in self.defaults.iter().chain(&self.custom) {
      if !out.contains(kw) {
        out.push(kw.clone());
      }
    }
    out
  }

  pub fn contains(&self, keyword: &str) -> bool {
    self.defaults.iter().chain(&self.custom).any(|k| k == keyword)
  }

  /// Append every keyword not yet known. Returns the ones written.
  pub fn append_new<S: AsRef<str>>(&mut self, keywords: &[S]) -> Result<Vec<String>> {
    let mut fresh: Vec<String> = Vec::new();
    for kw in keywords {
      let kw = kw.as_ref().trim();
      if !kw.is_empty() && !self.contains(kw) && !fresh.iter().any(|f| f == kw) {
        fresh.push(kw.to_owned());
      }
    }
    if fresh.is_empty() {
      return Ok(fresh);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    for kw in &fresh {
      writeln!(file, "{kw}")?;
    }
    file.flush()?;

    self.custom.extend(fresh.iter().cloned());
    Ok(fresh)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let reg = KeywordRegistry::load(dir.path().join("kw.txt"), vec!["Trump".into()]).unwrap();
    assert!(reg.custom().is_empty());
    assert_eq!(reg.all(), vec!["Trump".to_string()]);
  }

  #[test]
  fn appends_only_unknown_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kw.txt");
    let mut reg = KeywordRegistry::load(&path, vec!["Trump".into()]).unwrap();

    let written = reg.append_new(&["Trump", "Bannon", "Bannon", " ", "Bubba"]).unwrap();
    assert_eq!(written, vec!["Bannon".to_string(), "Bubba".to_string()]);
    assert!(reg.append_new(&["Bannon"]).unwrap().is_empty());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Bannon\nBubba\n");

    let reloaded = KeywordRegistry::load(&path, vec!["Trump".into()]).unwrap();
    assert_eq!(reloaded.all(), vec!["Trump", "Bannon", "Bubba"]);
  }
}

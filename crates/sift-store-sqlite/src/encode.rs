//! Helpers between Rust domain types and SQL text/parameters.
//!
//! Values are always bound as parameters. The only SQL assembled at runtime
//! is placeholder lists (`?3, ?4, ?5`) whose length is derived from a
//! caller-supplied collection.

use rusqlite::{Row, types::Value};
use sift_core::{
  corpus::File,
  entity::{CooccurrenceEdge, EntityLabel, EntitySummary},
};

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// `%term%` with `\`, `%` and `_` escaped; pair with `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for c in term.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Placeholders ────────────────────────────────────────────────────────────

/// Numbered placeholders `?first, …, ?(first + n - 1)`.
pub fn placeholders(first: usize, n: usize) -> String {
  (first..first + n)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `column LIKE ?first ESCAPE '\' OR …` over `n` numbered placeholders.
pub fn like_any(column: &str, first: usize, n: usize) -> String {
  (first..first + n)
    .map(|i| format!("{column} LIKE ?{i} ESCAPE '\\'"))
    .collect::<Vec<_>>()
    .join(" OR ")
}

/// Growable positional parameter list that hands out placeholder numbers.
#[derive(Default)]
pub struct Params {
  values: Vec<Value>,
}

impl Params {
  /// Bind `value`, returning its placeholder (e.g. `"?3"`).
  pub fn push(&mut self, value: impl Into<Value>) -> String {
    self.values.push(value.into());
    format!("?{}", self.values.len())
  }

  /// Bind every value, returning a comma-separated placeholder list.
  pub fn push_all<I, V>(&mut self, values: I) -> String
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    let first = self.values.len() + 1;
    self.values.extend(values.into_iter().map(Into::into));
    placeholders(first, self.values.len() + 1 - first)
  }

  pub fn into_values(self) -> Vec<Value> { self.values }
}

// ─── Row decoding ────────────────────────────────────────────────────────────

/// `id, filename, dataset, rel_path, file_size, has_text, needs_ocr`
pub const FILE_COLUMNS: &str =
  "f.id, f.filename, f.dataset, f.rel_path, f.file_size, f.has_text, f.needs_ocr";

pub fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
  Ok(File {
    id:        row.get(0)?,
    filename:  row.get(1)?,
    dataset:   row.get(2)?,
    rel_path:  row.get(3)?,
    file_size: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
    has_text:  row.get::<_, Option<bool>>(5)?.unwrap_or(false),
    needs_ocr: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
  })
}

/// `normalized, entity_label, mentions, files`
pub fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<EntitySummary> {
  Ok(EntitySummary {
    name:     row.get(0)?,
    label:    decode_label(row.get(1)?),
    mentions: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
    files:    row.get(3)?,
  })
}

/// `entity_a, entity_b, file_count`
pub fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<CooccurrenceEdge> {
  Ok(CooccurrenceEdge::new(
    row.get::<_, String>(0)?,
    row.get::<_, String>(1)?,
    row.get(2)?,
  ))
}

pub fn decode_label(raw: Option<String>) -> EntityLabel {
  EntityLabel::from(raw.unwrap_or_default())
}

pub fn encode_label(label: &EntityLabel) -> String { label.as_str().to_owned() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
  }

  #[test]
  fn placeholders_are_numbered() {
    assert_eq!(placeholders(3, 3), "?3, ?4, ?5");
    assert_eq!(placeholders(1, 0), "");
    assert_eq!(like_any("t", 2, 2), "t LIKE ?2 ESCAPE '\\' OR t LIKE ?3 ESCAPE '\\'");
  }

  #[test]
  fn params_track_positions() {
    let mut p = Params::default();
    assert_eq!(p.push(7_i64), "?1");
    assert_eq!(p.push_all(["a".to_string(), "b".to_string()]), "?2, ?3");
    assert_eq!(p.push("x".to_string()), "?4");
    assert_eq!(p.into_values().len(), 4);
  }
}

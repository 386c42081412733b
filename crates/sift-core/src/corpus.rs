//! Corpus records: files and their extracted text.
//!
//! Both are produced by the external ingestion pipeline and are read-only
//! here.

use serde::{Deserialize, Serialize};

/// A source document as registered by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
  pub id:        i64,
  pub filename:  String,
  pub dataset:   i64,
  pub rel_path:  String,
  pub file_size: i64,
  pub has_text:  bool,
  pub needs_ocr: bool,
}

/// A file together with its extracted text, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub file:       File,
  pub text:       Option<String>,
  pub char_count: Option<i64>,
  /// Extraction method recorded by ingestion (e.g. `"pdftotext"`).
  pub method:     Option<String>,
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Text-extraction state filter for [`FileQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStatus {
  #[default]
  Any,
  HasText,
  NeedsOcr,
  /// Neither extracted nor queued for OCR.
  NoText,
}

/// Parameters for [`CorpusStore::list_files`](crate::store::CorpusStore::list_files).
#[derive(Debug, Clone)]
pub struct FileQuery {
  pub dataset:  Option<i64>,
  /// Case-insensitive substring of the filename.
  pub filename: Option<String>,
  pub status:   TextStatus,
  pub limit:    usize,
}

impl Default for FileQuery {
  fn default() -> Self {
    Self { dataset: None, filename: None, status: TextStatus::Any, limit: 500 }
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Headline counts for the whole corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
  pub total_files:       i64,
  pub files_with_text:   i64,
  pub total_chars:       i64,
  pub distinct_keywords: i64,
  pub total_matches:     i64,
  pub needs_ocr:         i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
  pub dataset:   i64,
  pub files:     i64,
  pub size_mb:   f64,
  pub has_text:  i64,
  pub needs_ocr: i64,
}

/// One bar of a histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
  pub label: String,
  pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distributions {
  pub file_size:   Vec<Bucket>,
  pub text_length: Vec<Bucket>,
}

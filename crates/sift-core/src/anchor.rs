//! Anchor queries: "which keywords and entities share documents with X?"
//!
//! An [`Anchor`] selects the files whose text contains any of its terms; the
//! backend then aggregates stored keyword hits and entity mentions over that
//! file set. Nothing here is specific to a particular name.

use serde::{Deserialize, Serialize};

use crate::{entity::EntityLabel, literal, snippet::Snippet};

/// Characters kept either side of the first anchor term in a file preview.
pub const PREVIEW_RADIUS: usize = 300;

/// A case-insensitive "text contains any of these terms" predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
  pub terms: Vec<String>,
}

impl Anchor {
  /// Blank terms are dropped.
  pub fn new<I, S>(terms: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let terms = terms
      .into_iter()
      .map(Into::into)
      .filter(|t: &String| !t.trim().is_empty())
      .collect();
    Self { terms }
  }

  pub fn contains(term: impl Into<String>) -> Self { Self::new([term]) }

  pub fn is_empty(&self) -> bool { self.terms.is_empty() }

  pub fn matches(&self, text: &str) -> bool {
    self.terms.iter().any(|t| literal::contains(text, t))
  }

  /// Total occurrences of all terms in `text`.
  pub fn mentions(&self, text: &str) -> i64 {
    self.terms.iter().map(|t| literal::count(text, t) as i64).sum()
  }

  pub fn preview(&self, text: &str) -> Snippet {
    Snippet::locate_any(text, &self.terms, PREVIEW_RADIUS)
  }
}

/// Parameters for [`CorpusStore::anchor_query`](crate::store::CorpusStore::anchor_query).
#[derive(Debug, Clone)]
pub struct AnchorQuery {
  pub anchor:  Anchor,
  /// Keywords (exact, case-insensitive) and entity-name substrings to leave
  /// out of the statistics. Defaults to the anchor terms.
  pub exclude: Option<Vec<String>>,
  /// Maximum rows per statistics table.
  pub limit:   usize,
}

impl AnchorQuery {
  pub fn new(anchor: Anchor) -> Self { Self { anchor, exclude: None, limit: 30 } }

  /// Effective exclusion list, lowercased.
  pub fn exclusions(&self) -> Vec<String> {
    self
      .exclude
      .as_ref()
      .unwrap_or(&self.anchor.terms)
      .iter()
      .map(|t| t.trim().to_ascii_lowercase())
      .filter(|t| !t.is_empty())
      .collect()
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// A file in the anchor set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorFile {
  pub file_id:    i64,
  pub filename:   String,
  pub dataset:    i64,
  pub rel_path:   String,
  pub char_count: i64,
  /// Collapsed preview centred on the first anchor term.
  pub preview:    String,
}

/// A keyword co-occurring with the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStat {
  pub keyword: String,
  pub files:   i64,
  pub matches: i64,
}

/// An entity co-occurring with the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStat {
  pub name:     String,
  pub label:    EntityLabel,
  pub files:    i64,
  pub mentions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCount {
  pub dataset: i64,
  pub files:   i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReport {
  pub anchor:             Anchor,
  pub files:              Vec<AnchorFile>,
  /// Summed occurrences of the anchor terms over `files`.
  pub total_mentions:     i64,
  pub by_dataset:         Vec<DatasetCount>,
  pub keywords:           Vec<KeywordStat>,
  pub entities:           Vec<EntityStat>,
  /// `false` when entity data is absent and `entities` is empty for that reason.
  pub entities_available: bool,
}

impl AnchorReport {
  pub fn file_ids(&self) -> impl Iterator<Item = i64> + '_ {
    self.files.iter().map(|f| f.file_id)
  }
}

/// A named group of terms counted within an anchor set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub name:  String,
  pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category: String,
  /// Largest per-term count of anchor files containing the term.
  pub files:    i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_terms_are_dropped() {
    let a = Anchor::new(["Bannon", "  ", ""]);
    assert_eq!(a.terms, vec!["Bannon".to_string()]);
    assert!(Anchor::new(Vec::<String>::new()).is_empty());
  }

  #[test]
  fn matches_any_term() {
    let a = Anchor::new(["Steve Bannon", "Stephen Bannon"]);
    assert!(a.matches("met STEPHEN BANNON"));
    assert!(!a.matches("met Bannon"));
  }

  #[test]
  fn mentions_sum_over_terms() {
    let a = Anchor::new(["trump", "mar-a-lago"]);
    assert_eq!(a.mentions("Trump at Mar-a-Lago, trump again"), 3);
  }

  #[test]
  fn exclusions_default_to_anchor_terms() {
    let mut q = AnchorQuery::new(Anchor::new(["Donald Trump", "Trump"]));
    assert_eq!(q.exclusions(), vec!["donald trump", "trump"]);
    q.exclude = Some(vec!["Epstein".into()]);
    assert_eq!(q.exclusions(), vec!["epstein"]);
  }
}

//! Keyword indexing: the single-pass scanner and the report types.
//!
//! A [`KeywordScanner`] is built once per indexing run. Each document is
//! ASCII-folded once and every keyword finder runs over that folded copy, so
//! the corpus is read from storage exactly once regardless of how many
//! keywords are pending.

use memchr::memmem::Finder;
use serde::{Deserialize, Serialize};

use crate::{literal, snippet::Snippet};

/// Characters kept either side of the first match in stored context.
pub const CONTEXT_RADIUS: usize = 150;

// ─── Scanner ─────────────────────────────────────────────────────────────────

/// Literal, case-insensitive multi-keyword scanner.
pub struct KeywordScanner {
  keywords: Vec<String>,
  finders:  Vec<Finder<'static>>,
}

/// Occurrences of one keyword in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
  /// Index into [`KeywordScanner::keywords`].
  pub keyword: usize,
  pub count:   i64,
  /// Whitespace-collapsed window around the first occurrence.
  pub context: String,
}

impl KeywordScanner {
  /// Build a scanner. Keywords are trimmed; blanks and exact duplicates are
  /// dropped, first occurrence wins.
  pub fn new<I, S>(keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut kept: Vec<String> = Vec::new();
    for kw in keywords {
      let kw = kw.as_ref().trim();
      if !kw.is_empty() && !kept.iter().any(|k| k == kw) {
        kept.push(kw.to_owned());
      }
    }

    let finders = kept
      .iter()
      .map(|kw| Finder::new(&literal::fold(kw)).into_owned())
      .collect();

    Self { keywords: kept, finders }
  }

  pub fn keywords(&self) -> &[String] { &self.keywords }

  pub fn is_empty(&self) -> bool { self.keywords.is_empty() }

  /// Evaluate every keyword against one document's text.
  pub fn scan(&self, text: &str) -> Vec<KeywordMatch> {
    if text.is_empty() || self.is_empty() {
      return Vec::new();
    }

    let folded = literal::fold(text);
    let mut out = Vec::new();

    for (keyword, finder) in self.finders.iter().enumerate() {
      let mut hits = finder.find_iter(&folded);
      let Some(first) = hits.next() else {
        continue;
      };
      let count = 1 + hits.count() as i64;
      let span = first..first + finder.needle().len();
      out.push(KeywordMatch {
        keyword,
        count,
        context: Snippet::around(text, span, CONTEXT_RADIUS).collapsed(),
      });
    }

    out
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Per-keyword totals: distinct files and summed match counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTotal {
  pub keyword: String,
  pub files:   i64,
  pub matches: i64,
}

/// Outcome of one indexing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
  pub files_scanned: i64,
  /// One entry per indexed keyword, in request order. Keywords with no
  /// matches report zeros and have no stored rows.
  pub keywords:      Vec<KeywordTotal>,
}

impl IndexReport {
  /// Start a report with zeroed totals for each keyword.
  pub fn for_keywords(keywords: &[String]) -> Self {
    Self {
      files_scanned: 0,
      keywords:      keywords
        .iter()
        .map(|k| KeywordTotal { keyword: k.clone(), files: 0, matches: 0 })
        .collect(),
    }
  }

  /// Fold one document's matches into the totals.
  pub fn record(&mut self, matches: &[KeywordMatch]) {
    for m in matches {
      let total = &mut self.keywords[m.keyword];
      total.files += 1;
      total.matches += m.count;
    }
  }

  pub fn total_matches(&self) -> i64 { self.keywords.iter().map(|k| k.matches).sum() }
}

/// One stored keyword hit, joined with its file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordHit {
  pub file_id:     i64,
  pub filename:    String,
  pub dataset:     i64,
  pub match_count: i64,
  pub context:     String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_every_keyword_in_one_pass() {
    let scanner = KeywordScanner::new(["Trump", "Epstein", "Clinton"]);
    let text = "Trump met Epstein. TRUMP said trump was there.";
    let found = scanner.scan(text);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].keyword, 0);
    assert_eq!(found[0].count, 3);
    assert_eq!(found[1].keyword, 1);
    assert_eq!(found[1].count, 1);
  }

  #[test]
  fn keywords_are_literal() {
    let scanner = KeywordScanner::new(["a.c", "(x)"]);
    let found = scanner.scan("abc a.c (x) x");
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|m| m.count == 1));
  }

  #[test]
  fn blank_and_duplicate_keywords_are_dropped() {
    let scanner = KeywordScanner::new(["  Bannon ", "", "Bannon", "   "]);
    assert_eq!(scanner.keywords(), &["Bannon".to_string()]);
  }

  #[test]
  fn empty_text_has_no_matches() {
    let scanner = KeywordScanner::new(["Trump"]);
    assert!(scanner.scan("").is_empty());
  }

  #[test]
  fn context_is_collapsed_window_around_first_match() {
    let scanner = KeywordScanner::new(["maxwell"]);
    let padding = "x ".repeat(200);
    let text = format!("{padding}Ghislaine\n\nMaxwell{padding}");
    let found = scanner.scan(&text);

    let ctx = &found[0].context;
    assert!(ctx.contains("Ghislaine Maxwell"));
    assert!(ctx.chars().count() <= 2 * CONTEXT_RADIUS + "Maxwell".len());
  }

  #[test]
  fn report_accumulates_files_and_matches() {
    let scanner = KeywordScanner::new(["Trump"]);
    let mut report = IndexReport::for_keywords(scanner.keywords());
    for text in ["Trump Trump", "Trump Trump Trump Trump Trump", "trump"] {
      report.record(&scanner.scan(text));
    }
    assert_eq!(report.keywords[0].files, 3);
    assert_eq!(report.keywords[0].matches, 8);
    assert_eq!(report.total_matches(), 8);
  }
}

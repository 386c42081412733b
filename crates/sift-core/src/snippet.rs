//! Context windows around the first occurrence of a term.
//!
//! Keyword context stored in `search_results`, anchor file previews and
//! highlighted full-text hits all go through [`Snippet`]. Window sizes are
//! counted in characters, never bytes.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::literal;

/// A window of document text, optionally with the matched span marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
  pub text:      String,
  /// Byte range of the match within `text`.
  pub highlight: Option<Range<usize>>,
}

impl Snippet {
  /// Cut `radius` characters either side of `span` (byte offsets into `text`).
  pub fn around(text: &str, span: Range<usize>, radius: usize) -> Self {
    let start = text[..span.start]
      .char_indices()
      .rev()
      .take(radius)
      .last()
      .map_or(span.start, |(i, _)| i);
    let end = text[span.end..]
      .char_indices()
      .nth(radius)
      .map_or(text.len(), |(i, _)| span.end + i);

    Self {
      text:      text[start..end].to_owned(),
      highlight: Some(span.start - start..span.end - start),
    }
  }

  /// The first `chars` characters of `text`, unmarked.
  pub fn head(text: &str, chars: usize) -> Self {
    let end = text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i);
    Self { text: text[..end].to_owned(), highlight: None }
  }

  /// Window around the first occurrence of `term`, or the first
  /// `2 * radius` characters when the term cannot be located.
  pub fn locate(text: &str, term: &str, radius: usize) -> Self {
    Self::locate_any(text, std::slice::from_ref(&term), radius)
  }

  /// Like [`Snippet::locate`], centred on the earliest occurrence of any term.
  pub fn locate_any<T: AsRef<str>>(text: &str, terms: &[T], radius: usize) -> Self {
    let first = terms
      .iter()
      .filter_map(|t| {
        let t = t.as_ref();
        literal::find(text, t).map(|at| at..at + t.len())
      })
      .min_by_key(|span| span.start);

    match first {
      Some(span) => Self::around(text, span, radius),
      None => Self::head(text, radius * 2),
    }
  }

  /// Text with whitespace runs collapsed to single spaces.
  pub fn collapsed(&self) -> String {
    self.text.split_whitespace().collect::<Vec<_>>().join(" ")
  }

  /// Text with the matched span wrapped in `marker` on both sides.
  pub fn marked(&self, marker: &str) -> String {
    match &self.highlight {
      Some(span) => format!(
        "{}{marker}{}{marker}{}",
        &self.text[..span.start],
        &self.text[span.clone()],
        &self.text[span.end..],
      ),
      None => self.text.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn window_is_clamped_to_text_bounds() {
    let s = Snippet::locate("say Trump now", "trump", 150);
    assert_eq!(s.text, "say Trump now");
    assert_eq!(s.highlight, Some(4..9));
  }

  #[test]
  fn window_counts_characters_not_bytes() {
    let text = "ééééé Bannon ééééé";
    let s = Snippet::locate(text, "bannon", 2);
    assert_eq!(s.text, "é Bannon é");
    assert_eq!(s.marked("**"), "é **Bannon** é");
  }

  #[test]
  fn missing_term_falls_back_to_head() {
    let text = "a".repeat(1000);
    let s = Snippet::locate(&text, "zzz", 200);
    assert_eq!(s.text.len(), 400);
    assert!(s.highlight.is_none());
    assert_eq!(s.marked("**"), s.text);
  }

  #[test]
  fn collapsed_joins_whitespace() {
    let s = Snippet::locate("one\n\n  two\tTrump   three", "trump", 150);
    assert_eq!(s.collapsed(), "one two Trump three");
  }

  #[test]
  fn locate_any_uses_earliest_term() {
    let s = Snippet::locate_any("Stephen Bannon then Steve Bannon", &["Steve Bannon", "Stephen Bannon"], 0);
    assert_eq!(s.text, "Stephen Bannon");
  }
}

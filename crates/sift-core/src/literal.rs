//! Literal, ASCII case-insensitive substring matching.
//!
//! Folding is ASCII-only so that it agrees with SQLite's `LIKE` and so that
//! a byte offset in the folded copy is the same byte offset in the original
//! text. A folded match of a valid UTF-8 needle always starts and ends on a
//! char boundary of the original.
//!
//! Non-ASCII letters compare exactly: `"JOSÉ"` matches `"josÉ"` but not
//! `"josé"`. Full Unicode folding would make keyword counts disagree with
//! ad-hoc search, which goes through `LIKE`.

use memchr::memmem;

/// ASCII-lowercased copy of `text` with identical byte length.
pub fn fold(text: &str) -> Vec<u8> { text.as_bytes().to_ascii_lowercase() }

/// Byte offset of the first case-insensitive occurrence of `needle`.
pub fn find(haystack: &str, needle: &str) -> Option<usize> {
  if needle.is_empty() {
    return None;
  }
  memmem::find(&fold(haystack), &fold(needle))
}

pub fn contains(haystack: &str, needle: &str) -> bool {
  find(haystack, needle).is_some()
}

/// Number of non-overlapping, leftmost occurrences of `needle`.
pub fn count(haystack: &str, needle: &str) -> usize {
  if needle.is_empty() {
    return 0;
  }
  let folded = fold(needle);
  memmem::Finder::new(&folded).find_iter(&fold(haystack)).count()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn find_ignores_ascii_case() {
    assert_eq!(find("Hello TRUMP tower", "trump"), Some(6));
    assert_eq!(find("nothing here", "trump"), None);
  }

  #[test]
  fn empty_needle_never_matches() {
    assert_eq!(find("abc", ""), None);
    assert_eq!(count("abc", ""), 0);
  }

  #[test]
  fn count_is_non_overlapping() {
    assert_eq!(count("aaaa", "aa"), 2);
    assert_eq!(count("Trump trump TRUMP", "trump"), 3);
  }

  #[test]
  fn non_ascii_letters_keep_their_case() {
    assert_eq!(count("JOSÉ josÉ josé", "JOSÉ"), 2);
    assert!(!contains("josé", "JOSÉ"));
  }

  #[test]
  fn offsets_survive_multibyte_text() {
    let text = "Café — Épstein and Epstein";
    let at = find(text, "epstein").unwrap();
    assert_eq!(&text[at..at + 7], "Epstein");
  }
}

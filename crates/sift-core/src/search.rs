//! Ad-hoc full-text search: query, hits, and the batched result stream.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::snippet::Snippet;

/// Characters kept either side of the first occurrence in a hit.
pub const HIT_RADIUS: usize = 200;

/// Parameters for [`CorpusStore::search_text`](crate::store::CorpusStore::search_text).
#[derive(Debug, Clone)]
pub struct TextQuery {
  pub term:       String,
  /// Hard upper bound on hits; scanning stops once reached.
  pub cap:        usize,
  /// Rows fetched per round trip; one progress event per batch.
  pub batch_size: usize,
}

impl TextQuery {
  pub fn new(term: impl Into<String>) -> Self {
    Self { term: term.into(), cap: 200, batch_size: 10 }
  }

  pub fn with_cap(mut self, cap: usize) -> Self {
    self.cap = cap;
    self
  }

  /// An empty term matches nothing.
  pub fn is_blank(&self) -> bool { self.term.is_empty() || self.cap == 0 }
}

/// One matching document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextHit {
  pub file_id:     i64,
  pub filename:    String,
  pub dataset:     i64,
  pub rel_path:    String,
  pub snippet:     Snippet,
  /// `snippet` with the matched span wrapped in `**`.
  pub highlighted: String,
}

impl TextHit {
  /// Build a hit from a row, cutting the highlighted window from `text`.
  pub fn from_text(
    file_id: i64,
    filename: String,
    dataset: i64,
    rel_path: String,
    text: &str,
    term: &str,
  ) -> Self {
    let snippet = Snippet::locate(text, term, HIT_RADIUS);
    let highlighted = snippet.marked("**");
    Self { file_id, filename, dataset, rel_path, snippet, highlighted }
  }
}

/// A batch of hits plus the running total so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
  pub hits:         Vec<TextHit>,
  pub found_so_far: usize,
}

// ─── Stream ──────────────────────────────────────────────────────────────────

/// Receiving end of a running search.
///
/// Batches arrive as the backend scans; dropping the stream tells the
/// backend to stop.
pub struct SearchStream<E> {
  rx:    mpsc::Receiver<Result<Vec<TextHit>, E>>,
  found: usize,
  cap:   usize,
}

/// Sending end handed to the backend.
pub type SearchSender<E> = mpsc::Sender<Result<Vec<TextHit>, E>>;

impl<E> SearchStream<E> {
  /// Create a connected sender/stream pair buffering up to `bound` batches.
  pub fn channel(cap: usize, bound: usize) -> (SearchSender<E>, Self) {
    let (tx, rx) = mpsc::channel(bound.max(1));
    (tx, Self { rx, found: 0, cap })
  }

  /// A stream that yields nothing.
  pub fn empty() -> Self { Self::channel(0, 1).1 }

  /// Next batch with the updated running total, or `None` when finished.
  pub async fn next(&mut self) -> Option<Result<SearchProgress, E>> {
    match self.rx.recv().await? {
      Ok(mut hits) => {
        hits.truncate(self.cap.saturating_sub(self.found));
        self.found += hits.len();
        Some(Ok(SearchProgress { hits, found_so_far: self.found }))
      }
      Err(e) => Some(Err(e)),
    }
  }

  pub fn found_so_far(&self) -> usize { self.found }

  /// Drain the stream into a single vector.
  pub async fn collect(mut self) -> Result<Vec<TextHit>, E> {
    let mut all = Vec::new();
    while let Some(batch) = self.next().await {
      all.extend(batch?.hits);
    }
    Ok(all)
  }
}

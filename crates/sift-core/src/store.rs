//! The `CorpusStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `sift-store-sqlite`).
//! Higher layers (`sift-api`, `sift-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  anchor::{Anchor, AnchorQuery, AnchorReport, Category, CategoryCount},
  capability::Capabilities,
  corpus::{DatasetSummary, Distributions, Document, File, FileQuery, Overview},
  entity::{CooccurrenceReport, EntityLabel, EntityMention, EntitySummary},
  graph::{Graph, GraphParams},
  keyword::{IndexReport, KeywordHit, KeywordTotal},
  search::{SearchStream, TextQuery},
};

/// Abstraction over the persisted corpus.
///
/// `files`, extracted text and entity mentions are read-only inputs. The only
/// writes are [`index_keywords`](Self::index_keywords) and
/// [`aggregate_cooccurrence`](Self::aggregate_cooccurrence); each replaces
/// its target rows atomically.
pub trait CorpusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Corpus ────────────────────────────────────────────────────────────

  fn overview(&self) -> impl Future<Output = Result<Overview, Self::Error>> + Send + '_;

  fn dataset_breakdown(
    &self,
  ) -> impl Future<Output = Result<Vec<DatasetSummary>, Self::Error>> + Send + '_;

  /// File size and text length histograms.
  fn distributions(&self) -> impl Future<Output = Result<Distributions, Self::Error>> + Send + '_;

  fn list_files<'a>(
    &'a self,
    query: &'a FileQuery,
  ) -> impl Future<Output = Result<Vec<File>, Self::Error>> + Send + 'a;

  /// Retrieve a file with its extracted text. Returns `None` if not found.
  fn get_document(
    &self,
    file_id: i64,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  // ── Keywords ──────────────────────────────────────────────────────────

  /// Scan the corpus once for all `keywords` and replace their stored hits
  /// in a single transaction.
  fn index_keywords(
    &self,
    keywords: Vec<String>,
  ) -> impl Future<Output = Result<IndexReport, Self::Error>> + Send + '_;

  /// Stored keywords with at least `min_matches` total matches, by matches desc.
  fn keyword_summary(
    &self,
    min_matches: i64,
  ) -> impl Future<Output = Result<Vec<KeywordTotal>, Self::Error>> + Send + '_;

  /// Files with the most matches for one keyword.
  fn keyword_hits(
    &self,
    keyword: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<KeywordHit>, Self::Error>> + Send + '_;

  // ── Full-text search ──────────────────────────────────────────────────

  /// Start an unindexed substring search. Results arrive in batches on the
  /// returned stream.
  fn search_text(
    &self,
    query: TextQuery,
  ) -> impl Future<Output = Result<SearchStream<Self::Error>, Self::Error>> + Send + '_;

  // ── Anchors ───────────────────────────────────────────────────────────

  fn anchor_query<'a>(
    &'a self,
    query: &'a AnchorQuery,
  ) -> impl Future<Output = Result<AnchorReport, Self::Error>> + Send + 'a;

  /// For each category, how many anchor files contain its terms.
  fn category_counts<'a>(
    &'a self,
    anchor: &'a Anchor,
    categories: &'a [Category],
  ) -> impl Future<Output = Result<Vec<CategoryCount>, Self::Error>> + Send + 'a;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Probe which optional tables hold data.
  fn capabilities(&self) -> impl Future<Output = Result<Capabilities, Self::Error>> + Send + '_;

  fn entity_search(
    &self,
    substring: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EntityMention>, Self::Error>> + Send + '_;

  fn top_entities(
    &self,
    label: EntityLabel,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EntitySummary>, Self::Error>> + Send + '_;

  /// Rebuild the co-occurrence table from entity mentions.
  fn aggregate_cooccurrence(
    &self,
    max_entities_per_document: usize,
  ) -> impl Future<Output = Result<CooccurrenceReport, Self::Error>> + Send + '_;

  fn build_graph<'a>(
    &'a self,
    params: &'a GraphParams,
  ) -> impl Future<Output = Result<Graph, Self::Error>> + Send + 'a;
}

//! [`SqliteStore`], the SQLite implementation of [`CorpusStore`].

use std::{collections::BTreeMap, path::Path};

use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params_from_iter};
use sift_core::{
  anchor::{
    Anchor, AnchorFile, AnchorQuery, AnchorReport, Category, CategoryCount, DatasetCount,
    EntityStat, KeywordStat,
  },
  capability::{Capabilities, Capability, EntityStats},
  corpus::{
    Bucket, DatasetSummary, Distributions, Document, File, FileQuery, Overview, TextStatus,
  },
  entity::{
    CooccurrenceCounter, CooccurrenceEdge, CooccurrenceReport, EntityLabel, EntityMention,
    EntitySummary,
  },
  graph::{self, Graph, GraphInputs, GraphParams},
  keyword::{IndexReport, KeywordHit, KeywordMatch, KeywordScanner, KeywordTotal},
  search::{SearchSender, SearchStream, TextHit, TextQuery},
  store::CorpusStore,
};

use crate::{
  Error, Result,
  encode::{
    FILE_COLUMNS, Params, decode_label, edge_from_row, encode_label, file_from_row, like_any,
    like_pattern, summary_from_row,
  },
  schema::{COOCCURRENCE_SCHEMA, SCHEMA, SCRATCH_SCHEMA},
};

/// Batches buffered between the scanning thread and the search consumer.
const SEARCH_CHANNEL_BOUND: usize = 4;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sift corpus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// operation runs as one closure on the connection thread, so operations
/// never interleave. Searches are the exception: they take one call per
/// batch, and other operations run between batches. Writes additionally take
/// `BEGIN IMMEDIATE` to exclude writers in other processes.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(SCRATCH_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Probing ─────────────────────────────────────────────────────────────────

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
    [name],
    |r| r.get(0),
  )
}

/// Cheap presence check: table exists and has at least one row.
fn available(conn: &Connection, capability: Capability) -> rusqlite::Result<bool> {
  let (table, sql) = match capability {
    Capability::Entities => ("entities", "SELECT EXISTS (SELECT 1 FROM entities)"),
    Capability::Cooccurrence => {
      ("entity_cooccurrence", "SELECT EXISTS (SELECT 1 FROM entity_cooccurrence)")
    }
  };
  Ok(table_exists(conn, table)? && conn.query_row(sql, [], |r| r.get(0))?)
}

fn probe(conn: &Connection) -> rusqlite::Result<Capabilities> {
  let schema_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

  let entities = if available(conn, Capability::Entities)? {
    Some(conn.query_row(
      "SELECT COUNT(*), COUNT(DISTINCT normalized), COUNT(DISTINCT file_id) FROM entities",
      [],
      |r| Ok(EntityStats { mentions: r.get(0)?, unique: r.get(1)?, files: r.get(2)? }),
    )?)
  } else {
    None
  };

  let cooccurrence = if available(conn, Capability::Cooccurrence)? {
    Some(conn.query_row("SELECT COUNT(*) FROM entity_cooccurrence", [], |r| r.get(0))?)
  } else {
    None
  };

  Ok(Capabilities { schema_version, entities, cooccurrence })
}

/// Map the `None` a closure returns for a missing capability to an error.
fn required<T>(value: Option<T>, capability: Capability) -> Result<T> {
  value.ok_or(Error::CapabilityUnavailable(capability))
}

// ─── Anchor helpers ──────────────────────────────────────────────────────────

/// Select the anchor file set, record it in `temp.anchor_files`, and return
/// the files with their previews plus the summed anchor mentions.
fn fill_anchor_files(
  conn: &Connection,
  anchor: &Anchor,
) -> rusqlite::Result<(Vec<AnchorFile>, i64)> {
  conn.execute("DELETE FROM temp.anchor_files", [])?;
  if anchor.is_empty() {
    return Ok((Vec::new(), 0));
  }

  let sql = format!(
    "SELECT f.id, f.filename, f.dataset, f.rel_path, tc.char_count, tc.extracted_text
     FROM text_cache tc
     JOIN files f ON f.id = tc.file_id
     WHERE {}
     ORDER BY f.id",
    like_any("tc.extracted_text", 1, anchor.terms.len()),
  );
  let patterns: Vec<String> = anchor.terms.iter().map(|t| like_pattern(t)).collect();

  let mut files = Vec::new();
  let mut mentions = 0;
  {
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(patterns.iter()))?;
    while let Some(row) = rows.next()? {
      let text: String = row.get::<_, Option<String>>(5)?.unwrap_or_default();
      mentions += anchor.mentions(&text);
      files.push(AnchorFile {
        file_id:    row.get(0)?,
        filename:   row.get(1)?,
        dataset:    row.get(2)?,
        rel_path:   row.get(3)?,
        char_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        preview:    anchor.preview(&text).collapsed(),
      });
    }
  }

  let mut insert = conn.prepare("INSERT OR IGNORE INTO temp.anchor_files (file_id) VALUES (?1)")?;
  for f in &files {
    insert.execute([f.file_id])?;
  }

  Ok((files, mentions))
}

fn anchor_keyword_stats(
  conn: &Connection,
  exclusions: &[String],
  limit: usize,
) -> rusqlite::Result<Vec<KeywordStat>> {
  let mut params = Params::default();
  let exclude = if exclusions.is_empty() {
    String::new()
  } else {
    format!("WHERE lower(sr.keyword) NOT IN ({})", params.push_all(exclusions.iter().cloned()))
  };
  let limit = params.push(limit as i64);

  let sql = format!(
    "SELECT sr.keyword, COUNT(DISTINCT sr.file_id) AS files, SUM(sr.match_count)
     FROM search_results sr
     JOIN temp.anchor_files a ON a.file_id = sr.file_id
     {exclude}
     GROUP BY sr.keyword
     ORDER BY files DESC, sr.keyword
     LIMIT {limit}"
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params_from_iter(params.into_values()), |r| {
      Ok(KeywordStat { keyword: r.get(0)?, files: r.get(1)?, matches: r.get(2)? })
    })?
    .collect()
}

fn anchor_entity_stats(
  conn: &Connection,
  exclusions: &[String],
  limit: usize,
) -> rusqlite::Result<Vec<EntityStat>> {
  let mut params = Params::default();
  let exclude: Vec<String> = exclusions
    .iter()
    .map(|t| format!("e.normalized NOT LIKE {} ESCAPE '\\'", params.push(like_pattern(t))))
    .collect();
  let where_clause = if exclude.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", exclude.join(" AND "))
  };
  let limit = params.push(limit as i64);

  let sql = format!(
    "SELECT e.normalized, e.entity_label, COUNT(DISTINCT e.file_id) AS files, SUM(e.count)
     FROM entities e
     JOIN temp.anchor_files a ON a.file_id = e.file_id
     {where_clause}
     GROUP BY e.normalized, e.entity_label
     ORDER BY files DESC, e.normalized
     LIMIT {limit}"
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params_from_iter(params.into_values()), |r| {
      Ok(EntityStat {
        name:     r.get(0)?,
        label:    decode_label(r.get(1)?),
        files:    r.get(2)?,
        mentions: r.get::<_, Option<i64>>(3)?.unwrap_or(0),
      })
    })?
    .collect()
}

fn bucket_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Bucket> {
  Ok(Bucket { label: r.get(0)?, count: r.get(1)? })
}

fn by_dataset(files: &[AnchorFile]) -> Vec<DatasetCount> {
  let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
  for f in files {
    *counts.entry(f.dataset).or_insert(0) += 1;
  }
  counts.into_iter().map(|(dataset, files)| DatasetCount { dataset, files }).collect()
}

// ─── Graph helpers ───────────────────────────────────────────────────────────

fn graph_inputs(conn: &Connection, params: &GraphParams) -> rusqlite::Result<GraphInputs> {
  let mut inputs = GraphInputs::default();

  if !params.include_types.is_empty() && params.max_nodes > 0 {
    let mut p = Params::default();
    let types = p.push_all(params.include_types.iter().map(encode_label));
    let min_files = p.push(params.min_shared_files);
    let limit = p.push(params.max_nodes as i64);
    let sql = format!(
      "SELECT normalized, entity_label, SUM(count) AS mentions, COUNT(DISTINCT file_id) AS files
       FROM entities
       WHERE entity_label IN ({types})
       GROUP BY normalized
       HAVING files >= {min_files}
       ORDER BY files DESC, normalized
       LIMIT {limit}"
    );
    let mut stmt = conn.prepare(&sql)?;
    inputs.top = stmt
      .query_map(params_from_iter(p.into_values()), summary_from_row)?
      .collect::<rusqlite::Result<_>>()?;
  }

  {
    let mut stmt = conn.prepare(
      "SELECT normalized, entity_label, SUM(count), COUNT(DISTINCT file_id)
       FROM entities
       WHERE normalized = ?1
       GROUP BY normalized",
    )?;
    for name in &params.priority {
      if let Some(summary) = stmt.query_row([name], summary_from_row).optional()? {
        inputs.priority.push(summary);
      }
    }
  }

  // Restrict edge reads to the selected node set.
  conn.execute("DELETE FROM temp.graph_nodes", [])?;
  {
    let mut insert = conn.prepare("INSERT OR IGNORE INTO temp.graph_nodes (name) VALUES (?1)")?;
    for s in inputs.top.iter().take(params.max_nodes).chain(&inputs.priority) {
      insert.execute([&s.name])?;
    }
  }

  {
    let mut stmt = conn.prepare(
      "SELECT entity_a, entity_b, file_count
       FROM entity_cooccurrence
       WHERE file_count >= ?1
         AND entity_a IN (SELECT name FROM temp.graph_nodes)
         AND entity_b IN (SELECT name FROM temp.graph_nodes)
       ORDER BY file_count DESC",
    )?;
    inputs.edges = stmt
      .query_map([params.min_shared_files], edge_from_row)?
      .collect::<rusqlite::Result<_>>()?;
  }

  if !params.priority.is_empty() {
    let mut p = Params::default();
    let names = p.push_all(params.priority.iter().cloned());
    let sql = format!(
      "SELECT entity_a, entity_b, file_count
       FROM entity_cooccurrence
       WHERE file_count >= 1
         AND (entity_a IN ({names}) OR entity_b IN ({names}))
         AND entity_a IN (SELECT name FROM temp.graph_nodes)
         AND entity_b IN (SELECT name FROM temp.graph_nodes)
       ORDER BY file_count DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    inputs.priority_edges = stmt
      .query_map(params_from_iter(p.into_values()), edge_from_row)?
      .collect::<rusqlite::Result<_>>()?;
  }

  Ok(inputs)
}

// ─── Co-occurrence helper ────────────────────────────────────────────────────

fn flush_document(counter: &mut CooccurrenceCounter, file_id: i64, names: &[String]) {
  if !counter.add_document(names) {
    tracing::warn!(file_id, entities = names.len(), "skipping oversized document");
  }
}

// ─── Search helper ───────────────────────────────────────────────────────────

/// Up to `limit` hits for `term` among documents with `file_id > after`,
/// in file order.
fn search_batch(
  conn: &Connection,
  term: &str,
  after: i64,
  limit: usize,
) -> rusqlite::Result<Vec<TextHit>> {
  let mut stmt = conn.prepare_cached(
    "SELECT f.id, f.filename, f.dataset, f.rel_path, tc.extracted_text
     FROM text_cache tc
     JOIN files f ON f.id = tc.file_id
     WHERE tc.file_id > ?1 AND tc.extracted_text LIKE ?2 ESCAPE '\\'
     ORDER BY tc.file_id
     LIMIT ?3",
  )?;
  let rows = stmt.query_map(rusqlite::params![after, like_pattern(term), limit as i64], |row| {
    let text: String = row.get::<_, Option<String>>(4)?.unwrap_or_default();
    Ok(TextHit::from_text(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, &text, term))
  })?;
  rows.collect()
}

/// Drive a search to completion, one connection call per batch. The
/// connection is released between batches, and the consumer is awaited
/// outside it, so a slow reader only stalls its own scan.
async fn run_search(conn: tokio_rusqlite::Connection, query: TextQuery, tx: SearchSender<Error>) {
  let batch_size = query.batch_size.max(1);
  let mut after = i64::MIN;
  let mut sent = 0;

  while sent < query.cap && !tx.is_closed() {
    let limit = batch_size.min(query.cap - sent);
    let term = query.term.clone();
    let batch = conn
      .call(move |conn| Ok(search_batch(conn, &term, after, limit)?))
      .await;

    let batch = match batch {
      Ok(batch) => batch,
      Err(e) => {
        tracing::warn!(term = %query.term, "search failed: {e}");
        let _ = tx.send(Err(Error::Database(e))).await;
        return;
      }
    };

    let exhausted = batch.len() < limit;
    if let Some(last) = batch.last() {
      after = last.file_id;
      sent += batch.len();
      tracing::debug!(found = sent, term = %query.term, "search batch");
      if tx.send(Ok(batch)).await.is_err() {
        // Consumer went away.
        return;
      }
    }
    if exhausted {
      break;
    }
  }

  tracing::debug!(found = sent, term = %query.term, "search finished");
}

// ─── CorpusStore impl ────────────────────────────────────────────────────────

impl CorpusStore for SqliteStore {
  type Error = Error;

  // ── Corpus ────────────────────────────────────────────────────────────────

  async fn overview(&self) -> Result<Overview> {
    let overview = self
      .conn
      .call(|conn| {
        let (total_files, needs_ocr): (i64, i64) = conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(needs_ocr), 0) FROM files",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let (files_with_text, total_chars): (i64, i64) = conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(char_count), 0) FROM text_cache",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let (distinct_keywords, total_matches): (i64, i64) = conn.query_row(
          "SELECT COUNT(DISTINCT keyword), COALESCE(SUM(match_count), 0) FROM search_results",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(Overview {
          total_files,
          files_with_text,
          total_chars,
          distinct_keywords,
          total_matches,
          needs_ocr,
        })
      })
      .await?;
    Ok(overview)
  }

  async fn dataset_breakdown(&self) -> Result<Vec<DatasetSummary>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT dataset,
                  COUNT(*),
                  ROUND(COALESCE(SUM(file_size), 0) / 1024.0 / 1024.0, 1),
                  COALESCE(SUM(has_text), 0),
                  COALESCE(SUM(needs_ocr), 0)
           FROM files
           GROUP BY dataset
           ORDER BY dataset",
        )?;
        let rows = stmt
          .query_map([], |r| {
            Ok(DatasetSummary {
              dataset:   r.get(0)?,
              files:     r.get(1)?,
              size_mb:   r.get(2)?,
              has_text:  r.get(3)?,
              needs_ocr: r.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn distributions(&self) -> Result<Distributions> {
    let dist = self
      .conn
      .call(|conn| {
        let file_size = conn
          .prepare(
            "SELECT CASE
                      WHEN file_size < 10240    THEN '< 10KB'
                      WHEN file_size < 102400   THEN '10KB - 100KB'
                      WHEN file_size < 1048576  THEN '100KB - 1MB'
                      WHEN file_size < 10485760 THEN '1MB - 10MB'
                      ELSE '> 10MB'
                    END,
                    COUNT(*)
             FROM files
             GROUP BY 1
             ORDER BY MIN(file_size)",
          )?
          .query_map([], bucket_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let text_length = conn
          .prepare(
            "SELECT CASE
                      WHEN char_count < 100    THEN '< 100 chars'
                      WHEN char_count < 1000   THEN '100 - 1K chars'
                      WHEN char_count < 10000  THEN '1K - 10K chars'
                      WHEN char_count < 100000 THEN '10K - 100K chars'
                      ELSE '> 100K chars'
                    END,
                    COUNT(*)
             FROM text_cache
             GROUP BY 1
             ORDER BY MIN(char_count)",
          )?
          .query_map([], bucket_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Distributions { file_size, text_length })
      })
      .await?;
    Ok(dist)
  }

  async fn list_files(&self, query: &FileQuery) -> Result<Vec<File>> {
    let query = query.clone();

    let files = self
      .conn
      .call(move |conn| {
        let mut params = Params::default();
        let mut conds: Vec<String> = Vec::new();

        if let Some(ds) = query.dataset {
          conds.push(format!("f.dataset = {}", params.push(ds)));
        }
        if let Some(name) = query.filename.as_deref().filter(|n| !n.is_empty()) {
          conds.push(format!("f.filename LIKE {} ESCAPE '\\'", params.push(like_pattern(name))));
        }
        match query.status {
          TextStatus::Any => {}
          TextStatus::HasText => conds.push("f.has_text = 1".into()),
          TextStatus::NeedsOcr => conds.push("f.needs_ocr = 1".into()),
          TextStatus::NoText => conds.push("f.has_text = 0 AND f.needs_ocr = 0".into()),
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };
        let limit = params.push(query.limit as i64);

        let sql = format!(
          "SELECT {FILE_COLUMNS} FROM files f {where_clause}
           ORDER BY f.dataset, f.filename
           LIMIT {limit}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params.into_values()), file_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(files)
  }

  async fn get_document(&self, file_id: i64) -> Result<Option<Document>> {
    let doc = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FILE_COLUMNS}, tc.extracted_text, tc.char_count, tc.method
           FROM files f
           LEFT JOIN text_cache tc ON tc.file_id = f.id
           WHERE f.id = ?1"
        );
        Ok(
          conn
            .query_row(&sql, [file_id], |r| {
              Ok(Document {
                file:       file_from_row(r)?,
                text:       r.get(7)?,
                char_count: r.get(8)?,
                method:     r.get(9)?,
              })
            })
            .optional()?,
        )
      })
      .await?;
    Ok(doc)
  }

  // ── Keywords ──────────────────────────────────────────────────────────────

  async fn index_keywords(&self, keywords: Vec<String>) -> Result<IndexReport> {
    let scanner = KeywordScanner::new(&keywords);
    if scanner.is_empty() {
      return Ok(IndexReport::default());
    }

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut report = IndexReport::for_keywords(scanner.keywords());
        let mut pending: Vec<(i64, KeywordMatch)> = Vec::new();

        {
          let mut stmt = tx.prepare(
            "SELECT tc.file_id, tc.extracted_text
             FROM text_cache tc
             JOIN files f ON f.id = tc.file_id
             WHERE tc.char_count > 0
             ORDER BY tc.file_id",
          )?;
          let mut rows = stmt.query([])?;
          while let Some(row) = rows.next()? {
            let file_id: i64 = row.get(0)?;
            let text: String = row.get::<_, Option<String>>(1)?.unwrap_or_default();
            let found = scanner.scan(&text);
            report.files_scanned += 1;
            report.record(&found);
            pending.extend(found.into_iter().map(|m| (file_id, m)));
          }
        }

        {
          let mut delete = tx.prepare("DELETE FROM search_results WHERE keyword = ?1")?;
          for kw in scanner.keywords() {
            delete.execute([kw])?;
          }

          let mut insert = tx.prepare(
            "INSERT INTO search_results (file_id, keyword, match_count, context)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (file_id, m) in &pending {
            insert.execute(rusqlite::params![
              file_id,
              scanner.keywords()[m.keyword],
              m.count,
              m.context,
            ])?;
          }
        }

        tx.commit()?;
        Ok(report)
      })
      .await?;

    tracing::info!(
      keywords = report.keywords.len(),
      files_scanned = report.files_scanned,
      total_matches = report.total_matches(),
      "keyword index committed"
    );
    Ok(report)
  }

  async fn keyword_summary(&self, min_matches: i64) -> Result<Vec<KeywordTotal>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT keyword, COUNT(*), SUM(match_count) AS matches
           FROM search_results
           GROUP BY keyword
           HAVING matches >= ?1
           ORDER BY matches DESC, keyword",
        )?;
        let rows = stmt
          .query_map([min_matches], |r| {
            Ok(KeywordTotal { keyword: r.get(0)?, files: r.get(1)?, matches: r.get(2)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn keyword_hits(&self, keyword: String, limit: usize) -> Result<Vec<KeywordHit>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sr.file_id, f.filename, f.dataset, sr.match_count, sr.context
           FROM search_results sr
           JOIN files f ON f.id = sr.file_id
           WHERE sr.keyword = ?1
           ORDER BY sr.match_count DESC, sr.file_id
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![keyword, limit as i64], |r| {
            Ok(KeywordHit {
              file_id:     r.get(0)?,
              filename:    r.get(1)?,
              dataset:     r.get(2)?,
              match_count: r.get(3)?,
              context:     r.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Full-text search ──────────────────────────────────────────────────────

  async fn search_text(&self, query: TextQuery) -> Result<SearchStream<Error>> {
    if query.is_blank() {
      return Ok(SearchStream::empty());
    }

    let (tx, stream) = SearchStream::channel(query.cap, SEARCH_CHANNEL_BOUND);
    tokio::spawn(run_search(self.conn.clone(), query, tx));
    Ok(stream)
  }

  // ── Anchors ───────────────────────────────────────────────────────────────

  async fn anchor_query(&self, query: &AnchorQuery) -> Result<AnchorReport> {
    let query = query.clone();

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let (files, total_mentions) = fill_anchor_files(&tx, &query.anchor)?;
        let exclusions = query.exclusions();

        let keywords = anchor_keyword_stats(&tx, &exclusions, query.limit)?;
        let entities_available = available(&tx, Capability::Entities)?;
        let entities = if entities_available {
          anchor_entity_stats(&tx, &exclusions, query.limit)?
        } else {
          Vec::new()
        };
        tx.commit()?;

        Ok(AnchorReport {
          anchor: query.anchor,
          by_dataset: by_dataset(&files),
          files,
          total_mentions,
          keywords,
          entities,
          entities_available,
        })
      })
      .await?;

    if !report.entities_available {
      tracing::warn!("entity data unavailable; anchor entity stats skipped");
    }
    Ok(report)
  }

  async fn category_counts(
    &self,
    anchor: &Anchor,
    categories: &[Category],
  ) -> Result<Vec<CategoryCount>> {
    let anchor = anchor.clone();
    let categories = categories.to_vec();

    let counts = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        fill_anchor_files(&tx, &anchor)?;

        let mut counts = Vec::with_capacity(categories.len());
        {
          let mut stmt = tx.prepare(
            "SELECT COUNT(*)
             FROM text_cache tc
             JOIN temp.anchor_files a ON a.file_id = tc.file_id
             WHERE tc.extracted_text LIKE ?1 ESCAPE '\\'",
          )?;
          for category in categories {
            let mut best = 0_i64;
            for term in category.terms.iter().filter(|t| !t.is_empty()) {
              let n: i64 = stmt.query_row([like_pattern(term)], |r| r.get(0))?;
              best = best.max(n);
            }
            counts.push(CategoryCount { category: category.name, files: best });
          }
        }
        tx.commit()?;

        counts.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.category.cmp(&b.category)));
        Ok(counts)
      })
      .await?;
    Ok(counts)
  }

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn capabilities(&self) -> Result<Capabilities> {
    Ok(self.conn.call(|conn| Ok(probe(conn)?)).await?)
  }

  async fn entity_search(&self, substring: String, limit: usize) -> Result<Vec<EntityMention>> {
    let rows = self
      .conn
      .call(move |conn| {
        if !available(conn, Capability::Entities)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(
          "SELECT e.normalized, e.entity_label, e.file_id, f.filename, f.dataset, e.count
           FROM entities e
           JOIN files f ON f.id = e.file_id
           WHERE e.normalized LIKE ?1 ESCAPE '\\'
           ORDER BY e.count DESC, e.file_id
           LIMIT ?2",
        )?;
        let pattern = like_pattern(&substring.to_ascii_lowercase());
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit as i64], |r| {
            Ok(EntityMention {
              name:     r.get(0)?,
              label:    decode_label(r.get(1)?),
              file_id:  r.get(2)?,
              filename: r.get(3)?,
              dataset:  r.get(4)?,
              mentions: r.get::<_, Option<i64>>(5)?.unwrap_or(0),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;
    required(rows, Capability::Entities)
  }

  async fn top_entities(&self, label: EntityLabel, limit: usize) -> Result<Vec<EntitySummary>> {
    let label = encode_label(&label);

    let rows = self
      .conn
      .call(move |conn| {
        if !available(conn, Capability::Entities)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(
          "SELECT normalized, entity_label, SUM(count), COUNT(DISTINCT file_id) AS files
           FROM entities
           WHERE entity_label = ?1
           GROUP BY normalized
           ORDER BY files DESC, normalized
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![label, limit as i64], summary_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;
    required(rows, Capability::Entities)
  }

  async fn aggregate_cooccurrence(
    &self,
    max_entities_per_document: usize,
  ) -> Result<CooccurrenceReport> {
    let report = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, "entities")? {
          return Ok(None);
        }
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut counter = CooccurrenceCounter::new(max_entities_per_document);

        {
          let mut stmt =
            tx.prepare("SELECT file_id, normalized FROM entities ORDER BY file_id")?;
          let mut rows = stmt.query([])?;
          let mut current: Option<i64> = None;
          let mut names: Vec<String> = Vec::new();

          while let Some(row) = rows.next()? {
            let file_id: i64 = row.get(0)?;
            let name: Option<String> = row.get(1)?;
            if current != Some(file_id) {
              if let Some(prev) = current {
                flush_document(&mut counter, prev, &names);
              }
              names.clear();
              current = Some(file_id);
            }
            names.extend(name);
          }
          if let Some(prev) = current {
            flush_document(&mut counter, prev, &names);
          }
        }

        let (edges, report) = counter.into_edges();

        tx.execute_batch(COOCCURRENCE_SCHEMA)?;
        tx.execute("DELETE FROM entity_cooccurrence", [])?;
        {
          let mut insert = tx.prepare(
            "INSERT INTO entity_cooccurrence (entity_a, entity_b, file_count)
             VALUES (?1, ?2, ?3)",
          )?;
          for CooccurrenceEdge { a, b, weight } in &edges {
            insert.execute(rusqlite::params![a, b, weight])?;
          }
        }
        tx.commit()?;
        Ok(Some(report))
      })
      .await?;

    let report = required(report, Capability::Entities)?;
    tracing::info!(
      documents = report.documents,
      skipped = report.skipped_documents,
      pairs = report.pairs,
      "co-occurrence rebuilt"
    );
    Ok(report)
  }

  async fn build_graph(&self, params: &GraphParams) -> Result<Graph> {
    let params = params.clone();

    let graph = self
      .conn
      .call(move |conn| {
        for capability in [Capability::Entities, Capability::Cooccurrence] {
          if !available(conn, capability)? {
            return Ok(Err(capability));
          }
        }
        let tx = conn.transaction()?;
        let inputs = graph_inputs(&tx, &params)?;
        tx.commit()?;
        Ok(Ok(graph::assemble(&params, inputs)))
      })
      .await?;

    let graph = graph.map_err(Error::CapabilityUnavailable)?;
    tracing::info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "graph built");
    Ok(graph)
  }
}

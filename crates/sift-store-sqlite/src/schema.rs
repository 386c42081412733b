//! SQL schema for the sift SQLite store.
//!
//! `files` and `text_cache` are populated by the ingestion pipeline and
//! `entities` by the NER pass; this crate only creates what it needs to run
//! against an empty file. `PRAGMA user_version` is reported by the capability
//! probe.

/// Core corpus DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS files (
    id          INTEGER PRIMARY KEY,
    filename    TEXT    NOT NULL,
    dataset     INTEGER NOT NULL,
    rel_path    TEXT    NOT NULL,
    file_size   INTEGER NOT NULL DEFAULT 0,
    has_text    INTEGER NOT NULL DEFAULT 0,
    needs_ocr   INTEGER NOT NULL DEFAULT 0
);

-- Zero or one row per file.
CREATE TABLE IF NOT EXISTS text_cache (
    file_id        INTEGER PRIMARY KEY REFERENCES files(id),
    extracted_text TEXT    NOT NULL,
    char_count     INTEGER NOT NULL,
    method         TEXT
);

-- Sparse keyword x file matrix. Rows for a keyword are only ever replaced
-- wholesale by the indexer.
CREATE TABLE IF NOT EXISTS search_results (
    id          INTEGER PRIMARY KEY,
    file_id     INTEGER NOT NULL REFERENCES files(id),
    keyword     TEXT    NOT NULL,
    match_count INTEGER NOT NULL CHECK (match_count >= 1),
    context     TEXT    NOT NULL,
    UNIQUE (keyword, file_id)
);

CREATE INDEX IF NOT EXISTS search_results_file_idx ON search_results(file_id);

PRAGMA user_version = 1;
";

/// Created on first aggregation. One row per canonical pair.
pub const COOCCURRENCE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entity_cooccurrence (
    entity_a   TEXT    NOT NULL,
    entity_b   TEXT    NOT NULL,
    file_count INTEGER NOT NULL,
    PRIMARY KEY (entity_a, entity_b),
    CHECK (entity_a < entity_b)
);
";

/// Per-connection scratch tables for query-time file and node sets.
pub const SCRATCH_SCHEMA: &str = "
CREATE TEMP TABLE IF NOT EXISTS anchor_files (file_id INTEGER PRIMARY KEY);
CREATE TEMP TABLE IF NOT EXISTS graph_nodes (name TEXT PRIMARY KEY);
";

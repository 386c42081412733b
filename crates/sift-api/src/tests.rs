//! Router tests against a file-backed `SqliteStore` seeded through a second
//! connection.

use std::{path::Path, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use sift_core::registry::KeywordRegistry;
use sift_store_sqlite::SqliteStore;
use tokio::sync::Mutex;
use tower::ServiceExt as _;

use crate::{ApiConfig, ApiState, api_router};

struct Fixture {
  dir:   tempfile::TempDir,
  state: ApiState<SqliteStore>,
}

async fn fixture(docs: &[(i64, &str)]) -> Fixture {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("corpus.db");
  let store = SqliteStore::open(&db).await.unwrap();
  seed(&db, docs);

  let registry = KeywordRegistry::load(dir.path().join("keywords.txt"), vec!["Trump".into()])
    .unwrap();
  let state = ApiState {
    store:    Arc::new(store),
    registry: Arc::new(Mutex::new(registry)),
    config:   Arc::new(ApiConfig::default()),
  };
  Fixture { dir, state }
}

fn seed(db: &Path, docs: &[(i64, &str)]) {
  let conn = rusqlite::Connection::open(db).unwrap();
  for (id, text) in docs {
    conn
      .execute(
        "INSERT INTO files (id, filename, dataset, rel_path, file_size, has_text, needs_ocr)
         VALUES (?1, ?2, 1, ?2, 100, 1, 0)",
        rusqlite::params![id, format!("doc{id}.pdf")],
      )
      .unwrap();
    conn
      .execute(
        "INSERT INTO text_cache (file_id, extracted_text, char_count) VALUES (?1, ?2, ?3)",
        rusqlite::params![id, text, text.len() as i64],
      )
      .unwrap();
  }
}

async fn send(state: &ApiState<SqliteStore>, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  api_router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_text(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
  serde_json::from_str(&body_text(resp).await).unwrap()
}

// ── Corpus ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_counts_seeded_rows() {
  let f = fixture(&[(1, "alpha"), (2, "beta")]).await;
  let resp = send(&f.state, "GET", "/overview", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let v = body_json(resp).await;
  assert_eq!(v["total_files"], 2);
  assert_eq!(v["files_with_text"], 2);
}

#[tokio::test]
async fn missing_file_is_404_json() {
  let f = fixture(&[]).await;
  let resp = send(&f.state, "GET", "/files/77", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let v = body_json(resp).await;
  assert!(v["error"].as_str().unwrap().contains("77"));
}

// ── Keywords ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn indexing_records_new_keywords_in_registry() {
  let f = fixture(&[(1, "Trump and Maxwell"), (2, "maxwell again, MAXWELL")]).await;

  let resp = send(
    &f.state,
    "POST",
    "/keywords",
    Some(json!({ "keywords": ["Maxwell", "Trump"] })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let v = body_json(resp).await;
  assert_eq!(v["files_scanned"], 2);
  assert_eq!(v["registered"], json!(["Maxwell"]));

  let file = std::fs::read_to_string(f.dir.path().join("keywords.txt")).unwrap();
  assert_eq!(file, "Maxwell\n");

  let v = body_json(send(&f.state, "GET", "/keywords", None).await).await;
  assert_eq!(v["summary"][0]["keyword"], "Maxwell");
  assert_eq!(v["summary"][0]["matches"], 3);
  assert_eq!(v["registry"], json!(["Trump", "Maxwell"]));
}

#[tokio::test]
async fn indexing_nothing_is_bad_request() {
  let f = fixture(&[]).await;
  let resp = send(&f.state, "POST", "/keywords", Some(json!({ "keywords": [" "] }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Search ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_stream_emits_progress_then_done() {
  let docs: Vec<(i64, String)> = (1..=12).map(|i| (i, format!("page {i} says hello"))).collect();
  let docs: Vec<(i64, &str)> = docs.iter().map(|(i, t)| (*i, t.as_str())).collect();
  let f = fixture(&docs).await;

  let resp = send(&f.state, "GET", "/search/stream?term=HELLO", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/x-ndjson");

  let text = body_text(resp).await;
  let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0]["type"], "progress");
  assert_eq!(lines[0]["found_so_far"], 10);
  assert_eq!(lines[1]["found_so_far"], 12);
  assert_eq!(lines[2], json!({ "type": "done", "found": 12 }));
}

#[tokio::test]
async fn search_respects_cap_parameter() {
  let f = fixture(&[(1, "x hello"), (2, "y hello"), (3, "z hello")]).await;
  let v = body_json(send(&f.state, "GET", "/search?term=hello&cap=2", None).await).await;
  assert_eq!(v.as_array().unwrap().len(), 2);
  assert_eq!(v[0]["highlighted"], "x **hello**");
}

// ── Degradation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn graph_without_entities_degrades_with_warning() {
  let f = fixture(&[(1, "text")]).await;
  let resp = send(&f.state, "GET", "/graph", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let warning = resp.headers()[header::WARNING].to_str().unwrap().to_owned();
  assert!(warning.starts_with("199 sift"), "{warning}");
  let v = body_json(resp).await;
  assert_eq!(v, json!({ "nodes": [], "edges": [] }));
}

#[tokio::test]
async fn anchor_reports_files_and_flags_missing_entities() {
  let f = fixture(&[(1, "Bannon called"), (2, "nothing here")]).await;
  let resp = send(&f.state, "POST", "/anchor", Some(json!({ "terms": ["bannon"] }))).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(resp.headers().contains_key(header::WARNING));
  let v = body_json(resp).await;
  assert_eq!(v["files"].as_array().unwrap().len(), 1);
  assert_eq!(v["entities_available"], false);
}

#[tokio::test]
async fn anchor_without_terms_is_bad_request() {
  let f = fixture(&[]).await;
  let resp = send(&f.state, "POST", "/anchor", Some(json!({ "terms": ["  "] }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

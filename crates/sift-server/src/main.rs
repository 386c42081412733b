//! `sift`: corpus keyword indexing, search and co-occurrence.
//!
//! Reads `sift.toml` (or the path given with `--config`), opens the SQLite
//! corpus store, and either serves the JSON API or runs one operation and
//! prints the result.
//!
//! ```text
//! sift serve
//! sift index "Palm Beach" "Little St. James"
//! sift search "flight log" --cap 50
//! sift cooccur && sift graph --out graph.json
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sift_api::{ApiState, api_router};
use sift_core::{registry::KeywordRegistry, search::TextQuery, store::CorpusStore};
use sift_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::Settings;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sift", version, about = "Corpus keyword indexing and co-occurrence")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sift.toml")]
  config: PathBuf,

  /// Override `store_path` from the configuration.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API under `/api`.
  Serve,
  /// Print corpus counts and the per-dataset breakdown.
  Overview,
  /// Scan the corpus for keywords and replace their stored hits.
  Index {
    keywords: Vec<String>,
    /// Re-index every default and registered keyword.
    #[arg(long, conflicts_with = "keywords")]
    defaults: bool,
  },
  /// Case-insensitive substring search over extracted text.
  Search {
    term: String,
    #[arg(long)]
    cap:  Option<usize>,
  },
  /// Rebuild the entity co-occurrence table.
  Cooccur {
    #[arg(long)]
    max_entities: Option<usize>,
  },
  /// Build the entity graph and print it, or write it to `--out`.
  Graph {
    #[arg(long, value_name = "FILE")]
    out:              Option<PathBuf>,
    #[arg(long)]
    min_shared_files: Option<i64>,
    #[arg(long)]
    max_nodes:        Option<usize>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let mut settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to read config {:?}", cli.config))?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  let registry = KeywordRegistry::load(&settings.keywords_file, settings.default_keywords.clone())
    .with_context(|| format!("failed to read keyword registry {:?}", settings.keywords_file))?;

  match cli.command {
    Command::Serve => serve(store, registry, &settings).await,
    Command::Overview => {
      print_json(&store.overview().await?)?;
      print_json(&store.dataset_breakdown().await?)
    }
    Command::Index { keywords, defaults } => index(&store, registry, keywords, defaults).await,
    Command::Search { term, cap } => {
      let mut query = TextQuery::new(term).with_cap(cap.unwrap_or(settings.search.cap));
      query.batch_size = settings.search.batch_size;
      search(&store, query).await
    }
    Command::Cooccur { max_entities } => {
      let max = max_entities.unwrap_or(settings.cooccurrence.max_entities_per_document);
      print_json(&store.aggregate_cooccurrence(max).await?)
    }
    Command::Graph { out, min_shared_files, max_nodes } => {
      let mut params = settings.graph.params();
      if let Some(n) = min_shared_files {
        params.min_shared_files = n;
      }
      if let Some(n) = max_nodes {
        params.max_nodes = n;
      }
      let graph = store.build_graph(&params).await?;
      match out {
        Some(path) => {
          graph
            .write_cache(&path)
            .with_context(|| format!("failed to write graph to {path:?}"))?;
          tracing::info!(path = ?path, "graph written");
          Ok(())
        }
        None => print_json(&graph),
      }
    }
  }
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

async fn serve(
  store: SqliteStore,
  registry: KeywordRegistry,
  settings: &Settings,
) -> anyhow::Result<()> {
  let state = ApiState {
    store:    Arc::new(store),
    registry: Arc::new(Mutex::new(registry)),
    config:   Arc::new(settings.api_config()),
  };

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", settings.host, settings.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn index(
  store: &SqliteStore,
  mut registry: KeywordRegistry,
  keywords: Vec<String>,
  defaults: bool,
) -> anyhow::Result<()> {
  let keywords = if defaults { registry.all() } else { keywords };
  if keywords.iter().all(|k| k.trim().is_empty()) {
    anyhow::bail!("no keywords to index");
  }

  let report = store.index_keywords(keywords).await?;
  let indexed: Vec<&str> = report.keywords.iter().map(|k| k.keyword.as_str()).collect();
  let registered = registry
    .append_new(&indexed)
    .with_context(|| format!("failed to append to {:?}", registry.path()))?;

  for k in &report.keywords {
    println!("{:<32} {:>8} files {:>10} matches", k.keyword, k.files, k.matches);
  }
  if !registered.is_empty() {
    tracing::info!(keywords = ?registered, "registered new keywords");
  }
  Ok(())
}

async fn search(store: &SqliteStore, query: TextQuery) -> anyhow::Result<()> {
  let mut stream = store.search_text(query).await?;
  while let Some(batch) = stream.next().await {
    let batch = batch?;
    for hit in &batch.hits {
      println!("[{}] {} (dataset {})", hit.file_id, hit.filename, hit.dataset);
      println!("    {}", hit.highlighted.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    tracing::info!(found = batch.found_so_far, "searching");
  }
  Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

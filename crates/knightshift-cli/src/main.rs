//! knightshift pipeline binary.
//!
//! Reads `knightshift.toml` (or the path given with `--config`), layers
//! `KNIGHTSHIFT_*` environment variables on top, opens the SQLite store and
//! runs one or more pipeline stages. Each stage prints its summary as JSON.
//!
//! Nested keys use `__` in the environment, for example
//! `KNIGHTSHIFT_INGEST__LIMITS__MAX_RECORDS=100`.

use std::{
  fs::File,
  io::BufReader,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use knightshift_core::config::PipelineConfig;
use knightshift_lichess::LichessClient;
use knightshift_pgn::PgnFeed;
use knightshift_pipeline::{Enricher, Ingester, Validator};
use knightshift_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "KnightShift chess game pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "knightshift.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest games from the configured TV channels, or from a PGN file.
  Ingest {
    /// Read PGN blocks from this file instead of the network.
    #[arg(long)]
    file: Option<PathBuf>,
  },
  /// Validate and clean pending games.
  Validate,
  /// Fetch profiles for players of unflagged games.
  Enrich,
  /// Ingest, validate and enrich in sequence.
  Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = load_config(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Ingest { file: Some(path) } => ingest_file(&store, &cfg, &path).await?,
    Command::Ingest { file: None } => ingest_tv(&store, &cfg).await?,
    Command::Validate => validate(&store, &cfg).await?,
    Command::Enrich => enrich(&store, &cfg).await?,
    Command::Run => {
      ingest_tv(&store, &cfg).await?;
      validate(&store, &cfg).await?;
      enrich(&store, &cfg).await?;
    }
  }

  Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("KNIGHTSHIFT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("ingest.channels"),
    )
    .build()
    .context("failed to read configuration")?;

  settings
    .try_deserialize()
    .context("failed to deserialise PipelineConfig")
}

fn lichess(cfg: &PipelineConfig) -> anyhow::Result<LichessClient> {
  LichessClient::new(cfg.lichess.clone()).context("failed to build Lichess client")
}

fn print_summary(stage: &str, summary: &impl Serialize) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(summary)
    .with_context(|| format!("failed to serialise {stage} summary"))?;
  println!("{json}");
  Ok(())
}

async fn ingest_tv(store: &SqliteStore, cfg: &PipelineConfig) -> anyhow::Result<()> {
  let source = lichess(cfg)?;
  let summary = Ingester::new(store.clone(), cfg.ingest.clone())
    .run(&source)
    .await;
  print_summary("ingest", &summary)
}

async fn ingest_file(
  store: &SqliteStore,
  cfg: &PipelineConfig,
  path: &Path,
) -> anyhow::Result<()> {
  let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
  let mut feed = PgnFeed::new(BufReader::new(file));
  tracing::info!(path = %path.display(), "ingesting PGN file");
  let summary = Ingester::new(store.clone(), cfg.ingest.clone())
    .ingest_feed(&mut feed)
    .await;
  print_summary("ingest", &summary)
}

async fn validate(store: &SqliteStore, cfg: &PipelineConfig) -> anyhow::Result<()> {
  let summary = Validator::new(store.clone(), cfg.validate.clone())
    .run()
    .await
    .context("validation pass failed")?;
  print_summary("validate", &summary)
}

async fn enrich(store: &SqliteStore, cfg: &PipelineConfig) -> anyhow::Result<()> {
  let source = lichess(cfg)?;
  let summary = Enricher::new(store.clone(), source, cfg.enrich.clone())
    .run()
    .await
    .context("enrichment pass failed")?;
  print_summary("enrich", &summary)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

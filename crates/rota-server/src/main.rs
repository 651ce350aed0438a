//! rota-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the Rota API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rota_core::{ReviewEngine, selector::ReviewerSelector};
use rota_server::ServerConfig;
use rota_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rota reviewer assignment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Seed the reviewer picker for reproducible assignments.
  #[arg(long)]
  seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Initialise tracing; a configured filter wins over RUST_LOG.
  let filter = match &server_cfg.log_filter {
    Some(directives) => EnvFilter::try_new(directives)
      .with_context(|| format!("invalid log_filter {directives:?}"))?,
    None => EnvFilter::builder()
      .with_default_directive(LevelFilter::INFO.into())
      .from_env_lossy(),
  };
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let selector = match cli.seed {
    Some(seed) => {
      tracing::info!(seed, "using seeded reviewer selection");
      ReviewerSelector::seeded(seed)
    }
    None => ReviewerSelector::from_entropy(),
  };
  let engine = Arc::new(ReviewEngine::with_selector(Arc::new(store), selector));

  let app = rota_server::app(engine);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

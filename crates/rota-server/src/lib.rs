//! Bootstrap pieces for the Rota server binary: configuration loading and
//! application assembly.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use rota_core::{ReviewEngine, store::RotaStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Server configuration, read from an optional TOML file layered under
/// `ROTA_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// `EnvFilter` directives; overrides `RUST_LOG` when set.
  #[serde(default)]
  pub log_filter: Option<String>,
}

impl ServerConfig {
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    let mut cfg: Self = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "rota.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROTA"))
      .build()?
      .try_deserialize()?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The API router with request tracing attached.
pub fn app<S: RotaStore + 'static>(engine: Arc<ReviewEngine<S>>) -> Router {
  rota_api::api_router(engine).layer(TraceLayer::new_for_http())
}

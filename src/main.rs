mod api;
mod app;
mod catalog;
mod commands;
mod config;
mod db;
mod error;
mod event;
mod filter;
mod forms;
mod logging;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::db::flags::ANALYSIS_COMPLETED;
use crate::db::{Database, Flags};
use crate::query::{NoopStorage, QueryStore, SnapshotStorage, SqliteSnapshots};

#[derive(Parser, Debug)]
#[command(name = "careerdash")]
#[command(about = "Career guidance in the terminal: analysis, roadmaps, internships and books")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/careerdash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overrides the config file
  #[arg(short, long)]
  backend: Option<String>,

  /// Forget that the career analysis was completed
  #[arg(long)]
  reset_analysis: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(backend) = args.backend {
    config.backend.url = backend;
  }

  let _log_guard = logging::init(&db::data_dir()?.join("logs"), &config.log.level)?;

  let db = Database::open()?;
  let flags = Flags::new(db.clone());
  if args.reset_analysis {
    flags.set_bool(ANALYSIS_COMPLETED, false)?;
    info!("analysis flag cleared");
  }

  let api = ApiClient::new(&config.backend)?;
  let storage: Arc<dyn SnapshotStorage> = if config.cache.persist {
    Arc::new(SqliteSnapshots::new(db))
  } else {
    Arc::new(NoopStorage)
  };
  let store = QueryStore::with_storage(api.clone(), config.store_options(), storage);

  // Skip the login form when credentials are configured
  if let (Some(username), Some(password)) = (config.username.as_deref(), config::Config::get_password()) {
    if let Err(e) = api.login(username, &password).await {
      warn!(username, error = %e, "auto-login failed");
    }
  }

  let ctx = app::Context { store, api, flags };
  let mut app = app::App::new(ctx, config);
  app.run().await?;

  Ok(())
}

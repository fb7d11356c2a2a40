//! `peerval` server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layered under
//! `PEERVAL_*` environment variables, opens the SQLite store and serves the
//! web application. Two maintenance subcommands share the same config:
//!
//! ```text
//! peerval add-professor --name "Dr. Knuth" --email knuth@uni.edu --password taocp
//! peerval open-evaluations --course-id 3
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use peerval_core::{model::NewProfessor, store::PeerEvalStore};
use peerval_store_sqlite::SqliteStore;
use peerval_web::{
  AppState, ServerConfig,
  notify::{Event, Notifier},
  session::SessionStore,
};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Peer evaluation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the web application (the default).
  Serve,

  /// Register a professor account.
  AddProfessor {
    #[arg(long)]
    name:       String,
    #[arg(long)]
    email:      String,
    #[arg(long)]
    password:   String,
    #[arg(long)]
    department: Option<String>,
  },

  /// Create the evaluation rows between members of each group in a course.
  OpenEvaluations {
    #[arg(long)]
    course_id: i64,
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
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PEERVAL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let notifier = Notifier::new(
    server_cfg.webhook_url.clone(),
    server_cfg.webhook_secret.clone(),
    Duration::from_secs(server_cfg.webhook_timeout_secs),
  )
  .context("failed to build webhook client")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, notifier, server_cfg).await,
    Command::AddProfessor { name, email, password, department } => {
      let professor = store
        .add_professor(NewProfessor { name, email, password, department })
        .await
        .context("failed to add professor")?;
      println!("added professor {} <{}>", professor.professor_id, professor.email);
      Ok(())
    }
    Command::OpenEvaluations { course_id } => {
      let created = store
        .open_group_evaluations(course_id)
        .await
        .with_context(|| format!("failed to open evaluations for course {course_id}"))?;
      println!("created {created} evaluations for course {course_id}");

      let course = store.course(course_id).await.context("failed to load course")?;
      if created > 0
        && let Some(event) = course.as_ref().and_then(Event::assigned)
        && let Err(e) = notifier.deliver(&event).await
      {
        tracing::warn!(error = %e, course_id, "webhook notification failed");
      }
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, notifier: Notifier, server_cfg: ServerConfig) -> anyhow::Result<()> {
  // Build application state.
  let state = AppState {
    store: Arc::new(store),
    sessions: SessionStore::new(Duration::from_secs(server_cfg.session_ttl_secs)),
    notifier,
    config: Arc::new(server_cfg.clone()),
  };

  let app = peerval_web::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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

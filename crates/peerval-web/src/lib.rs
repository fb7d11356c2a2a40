//! HTTP layer for the peer-evaluation service.
//!
//! Exposes an axum [`Router`] backed by any [`PeerEvalStore`]. Handlers
//! answer with JSON: success bodies carry data and/or a `message` plus the
//! `redirect` the client should follow; errors are rendered by [`ApiError`].

pub mod accounts;
pub mod error;
pub mod extract;
pub mod groups;
pub mod notify;
pub mod professor;
pub mod roster;
pub mod session;
pub mod student;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::get,
};
use peerval_core::store::PeerEvalStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use error::ApiError;

use notify::Notifier;
use session::SessionStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PEERVAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub static_dir:           PathBuf,
  pub webhook_url:          Option<String>,
  pub webhook_secret:       String,
  pub webhook_timeout_secs: u64,
  pub session_ttl_secs:     u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".into(),
      port:                 5000,
      store_path:           PathBuf::from("peerval.db"),
      static_dir:           PathBuf::from("static"),
      webhook_url:          None,
      webhook_secret:       String::new(),
      webhook_timeout_secs: 5,
      session_ttl_secs:     session::DEFAULT_TTL.as_secs(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: PeerEvalStore> {
  pub store:    Arc<S>,
  pub sessions: SessionStore,
  pub notifier: Notifier,
  pub config:   Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PeerEvalStore + Clone + 'static,
{
  let assets = ServeDir::new(&state.config.static_dir);

  Router::new()
    .route("/", get(index))
    // Accounts
    .route("/login", get(accounts::login_form).post(accounts::login::<S>))
    .route("/logout", get(accounts::logout::<S>))
    .route("/signup", get(accounts::signup_form).post(accounts::signup::<S>))
    .route("/get-started", get(accounts::get_started_form).post(accounts::get_started::<S>))
    // Students
    .route("/student-dashboard", get(student::dashboard::<S>))
    .route("/peer_evaluation/{id}", get(student::evaluation::<S>).post(student::submit::<S>))
    // Professors
    .route("/professor-dashboard", get(professor::dashboard::<S>))
    .route("/course-analysis/{course_id}", get(professor::course_analysis::<S>))
    .route(
      "/assign-evaluations",
      get(professor::assign_form::<S>).post(professor::assign::<S>),
    )
    .route("/import-course-roster", get(roster::upload_form::<S>).post(roster::import::<S>))
    .route("/creating-groups/{course_id}", get(groups::form::<S>).post(groups::create::<S>))
    .route("/groups-in-your-class", get(groups::list::<S>))
    .nest_service("/static", assets)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /`
async fn index() -> Json<Value> {
  Json(json!({
    "service": "peerval",
    "version": env!("CARGO_PKG_VERSION"),
    "login":   "/login",
    "signup":  "/signup",
  }))
}

/// `{"message": .., "redirect": ..}` plus any extra fields in `data`.
pub(crate) fn reply(message: impl Into<String>, redirect: impl Into<String>, data: Value) -> Json<Value> {
  merged(json!({ "message": message.into(), "redirect": redirect.into() }), data)
}

/// Describes a form: where it posts and which fields it expects.
pub(crate) fn form_page(action: &str, fields: &[&str], data: Value) -> Json<Value> {
  merged(json!({ "action": action, "fields": fields }), data)
}

/// `base` with the fields of `extra` added when `extra` is an object.
fn merged(mut base: Value, extra: Value) -> Json<Value> {
  if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
    base.extend(extra);
  }
  Json(base)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;

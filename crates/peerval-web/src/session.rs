//! Cookie sessions and the extractors that gate student and professor routes.
//!
//! Sessions live in memory, keyed by a random UUID carried in the
//! `peerval_session` cookie. Each one expires after the store's TTL; expired
//! entries are refused on lookup and pruned whenever a new session is created.
//! Restarting the server logs everyone out.

use std::{
  collections::HashMap,
  sync::Arc,
  time::{Duration, Instant},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use peerval_core::{model::UserKind, store::PeerEvalStore};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const COOKIE_NAME: &str = "peerval_session";

/// Eight hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Upper bound on any configured TTL.
const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// The signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
  pub kind:    UserKind,
  pub user_id: i64,
  pub name:    String,
  pub email:   String,
}

struct Entry {
  session:    Session,
  expires_at: Instant,
}

/// Server-side session table.
#[derive(Clone)]
pub struct SessionStore {
  inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
  ttl:   Duration,
}

impl Default for SessionStore {
  fn default() -> Self { Self::new(DEFAULT_TTL) }
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self {
    Self { inner: Arc::default(), ttl: ttl.min(MAX_TTL) }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  pub async fn create(&self, session: Session) -> Uuid {
    let now = Instant::now();
    let mut table = self.inner.write().await;

    let before = table.len();
    table.retain(|_, entry| entry.expires_at > now);
    let pruned = before - table.len();
    if pruned > 0 {
      tracing::debug!(pruned, "pruned expired sessions");
    }

    let id = Uuid::new_v4();
    table.insert(id, Entry { session, expires_at: now + self.ttl });
    id
  }

  /// The live session under `id`; expired ones are treated as absent.
  pub async fn get(&self, id: Uuid) -> Option<Session> {
    let table = self.inner.read().await;
    table
      .get(&id)
      .filter(|entry| entry.expires_at > Instant::now())
      .map(|entry| entry.session.clone())
  }

  pub async fn remove(&self, id: Uuid) -> Option<Session> {
    self.inner.write().await.remove(&id).map(|entry| entry.session)
  }

  #[cfg(test)]
  pub(crate) async fn len(&self) -> usize { self.inner.read().await.len() }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// The session id carried by the request's cookies, if well-formed.
pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
  jar
    .get(COOKIE_NAME)
    .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// The cookie handed out at login. It lives as long as the session does.
pub fn session_cookie(id: Uuid, ttl: Duration) -> Cookie<'static> {
  let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
  Cookie::build((COOKIE_NAME, id.to_string()))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .max_age(cookie::time::Duration::seconds(max_age))
    .build()
}

/// Matches [`session_cookie`] so `CookieJar::remove` clears it.
pub fn removal_cookie() -> Cookie<'static> {
  Cookie::build(COOKIE_NAME)
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .build()
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Present in a handler means a student is signed in.
pub struct StudentSession(pub Session);

/// Present in a handler means a professor is signed in.
pub struct ProfessorSession(pub Session);

async fn require<S>(parts: &Parts, state: &AppState<S>, kind: UserKind) -> Result<Session, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let denied = || ApiError::Unauthorized("Please log in to continue.".into());
  let jar = CookieJar::from_headers(&parts.headers);
  let id = session_id(&jar).ok_or_else(denied)?;
  let session = state.sessions.get(id).await.ok_or_else(denied)?;
  if session.kind != kind {
    return Err(denied());
  }
  Ok(session)
}

impl<S> FromRequestParts<AppState<S>> for StudentSession
where
  S: PeerEvalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    require(parts, state, UserKind::Student).await.map(StudentSession)
  }
}

impl<S> FromRequestParts<AppState<S>> for ProfessorSession
where
  S: PeerEvalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    require(parts, state, UserKind::Professor).await.map(ProfessorSession)
  }
}

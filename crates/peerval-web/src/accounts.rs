//! Handlers for sign-in, sign-out and student registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET/POST` | `/login` | Body: `email`, `password`, `user_type` |
//! | `GET` | `/logout` | Clears the session cookie |
//! | `GET/POST` | `/signup` | Body: `name`, `email` |
//! | `GET/POST` | `/get-started` | Body: `fname`, `lname`, `email` |

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use peerval_core::{
  model::{NewStudent, UserKind},
  store::PeerEvalStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, form_page, reply,
  error::ApiError,
  extract::Form,
  session::{self, Session},
};

// ─── Login ────────────────────────────────────────────────────────────────────

/// `GET /login`
pub async fn login_form() -> Json<Value> {
  form_page("/login", &["email", "password", "user_type"], json!({
    "user_types": ["student", "professor"],
  }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
  pub email:     String,
  pub password:  String,
  pub user_type: String,
}

/// `POST /login`
///
/// Students sign in by email alone; professors must also match their
/// stored password.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  Form(body): Form<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let email = body.email.trim().to_owned();
  if email.is_empty() {
    return Err(ApiError::invalid("Please enter your email address.", "/login"));
  }
  let rejected = || ApiError::Unauthorized("Invalid email or password.".into());

  let (session, redirect) = match body.user_type.trim() {
    "student" => {
      let student = state
        .store
        .student_by_email(email)
        .await
        .map_err(|e| ApiError::from_store(e, "/login"))?
        .ok_or_else(rejected)?;
      let session = Session {
        kind:    UserKind::Student,
        user_id: student.student_id,
        name:    student.name,
        email:   student.email,
      };
      (session, "/student-dashboard")
    }
    "professor" => {
      let professor = state
        .store
        .professor_by_email(email)
        .await
        .map_err(|e| ApiError::from_store(e, "/login"))?
        .filter(|p| p.password == body.password)
        .ok_or_else(rejected)?;
      let session = Session {
        kind:    UserKind::Professor,
        user_id: professor.professor_id,
        name:    professor.name,
        email:   professor.email,
      };
      (session, "/professor-dashboard")
    }
    other => {
      return Err(ApiError::invalid(
        format!("Unknown user type {other:?}; choose student or professor."),
        "/login",
      ));
    }
  };

  tracing::info!(user_id = session.user_id, kind = ?session.kind, "signed in");
  let name = session.name.clone();
  let id = state.sessions.create(session).await;
  Ok((
    jar.add(session::session_cookie(id, state.sessions.ttl())),
    reply(format!("Welcome, {name}!"), redirect, Value::Null),
  ))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `GET /logout`
pub async fn logout<S>(State(state): State<AppState<S>>, jar: CookieJar) -> impl IntoResponse
where
  S: PeerEvalStore + Clone + 'static,
{
  if let Some(id) = session::session_id(&jar) {
    state.sessions.remove(id).await;
  }
  (
    jar.remove(session::removal_cookie()),
    reply("You have been logged out.", "/login", Value::Null),
  )
}

// ─── Registration ─────────────────────────────────────────────────────────────

/// `GET /signup`
pub async fn signup_form() -> Json<Value> {
  form_page("/signup", &["name", "email"], Value::Null)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupBody {
  pub name:  String,
  pub email: String,
}

/// `POST /signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Form(body): Form<SignupBody>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  register(&state, body.name, body.email, "/signup").await
}

/// `GET /get-started`
pub async fn get_started_form() -> Json<Value> {
  form_page("/get-started", &["fname", "lname", "email"], Value::Null)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetStartedBody {
  pub fname: String,
  pub lname: String,
  pub email: String,
}

/// `POST /get-started`
pub async fn get_started<S>(
  State(state): State<AppState<S>>,
  Form(body): Form<GetStartedBody>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let name = format!("{} {}", body.fname.trim(), body.lname.trim());
  register(&state, name, body.email, "/get-started").await
}

async fn register<S>(
  state: &AppState<S>,
  name: String,
  email: String,
  form: &str,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  if name.trim().is_empty() || email.trim().is_empty() {
    return Err(ApiError::invalid("Please provide your name and email address.", form));
  }
  let student = state
    .store
    .add_student(NewStudent { name, email })
    .await
    .map_err(|e| ApiError::from_store(e, form))?;

  Ok(reply("Account created! Please log in.", "/login", json!({ "student": student })))
}

//! Professor-facing handlers: dashboard, course analysis and due dates.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use peerval_core::store::PeerEvalStore;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, form_page, reply,
  error::ApiError,
  extract::{Form, Path},
  notify::Event,
  session::ProfessorSession,
};

pub(crate) const DASHBOARD: &str = "/professor-dashboard";

/// `GET /professor-dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let courses = state
    .store
    .courses_for_professor(session.user_id)
    .await
    .map_err(|e| ApiError::from_store(e, "/"))?;

  Ok(Json(json!({
    "professor": { "professor_id": session.user_id, "name": session.name, "email": session.email },
    "courses":   courses,
  })))
}

/// `GET /course-analysis/{course_id}`
pub async fn course_analysis<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
  Path(course_id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let analysis = state
    .store
    .course_analysis(session.user_id, course_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;
  let course = state
    .store
    .course(course_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;

  Ok(Json(json!({ "course": course, "analysis": analysis })))
}

// ─── Due dates ────────────────────────────────────────────────────────────────

/// `GET /assign-evaluations`
pub async fn assign_form<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let courses = state
    .store
    .courses_for_professor(session.user_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;

  Ok(form_page("/assign-evaluations", &["course_id", "due_date"], json!({ "courses": courses })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignBody {
  pub course_id: String,
  /// `YYYY-MM-DD`
  pub due_date:  String,
}

/// `POST /assign-evaluations`
pub async fn assign<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
  Form(body): Form<AssignBody>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  const BACK: &str = "/assign-evaluations";

  let course_id: i64 = body
    .course_id
    .trim()
    .parse()
    .map_err(|_| ApiError::invalid("Please select a course.", BACK))?;
  let due = NaiveDate::parse_from_str(body.due_date.trim(), "%Y-%m-%d")
    .map_err(|_| ApiError::invalid("Please provide a due date as YYYY-MM-DD.", BACK))?;

  let course = state
    .store
    .assign_due_date(session.user_id, course_id, due)
    .await
    .map_err(|e| ApiError::from_store(e, BACK))?;

  if let Some(event) = Event::assigned(&course) {
    state.notifier.notify(event);
  }

  Ok(reply(
    format!("Evaluations for {} are due on {due}.", course.course_code),
    DASHBOARD,
    json!({ "course": course }),
  ))
}

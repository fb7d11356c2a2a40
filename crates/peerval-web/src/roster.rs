//! Roster upload: `GET/POST /import-course-roster`.
//!
//! The POST is `multipart/form-data` with fields `course_code`, optional
//! `course_name`, and `file` (the CSV roster).

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
};
use peerval_core::{model::CourseRef, roster::parse_roster, store::PeerEvalStore};
use serde_json::{Value, json};

use crate::{
  AppState, form_page, reply,
  error::ApiError,
  professor::DASHBOARD,
  session::ProfessorSession,
};

const BACK: &str = "/import-course-roster";

/// `GET /import-course-roster`
pub async fn upload_form<S>(
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

  Ok(form_page(BACK, &["course_code", "course_name", "file"], json!({ "courses": courses })))
}

/// `POST /import-course-roster`
pub async fn import<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let mut multipart = multipart?;
  let malformed = |e: axum::extract::multipart::MultipartError| {
    ApiError::invalid(format!("Could not read the upload: {e}"), BACK)
  };

  let mut code = None;
  let mut name = None;
  let mut file = None;
  while let Some(field) = multipart.next_field().await.map_err(malformed)? {
    match field.name() {
      Some("course_code") => code = Some(field.text().await.map_err(malformed)?),
      Some("course_name") => name = Some(field.text().await.map_err(malformed)?),
      Some("file") => file = Some(field.bytes().await.map_err(malformed)?),
      _ => {}
    }
  }

  let code = code
    .map(|c| c.trim().to_owned())
    .filter(|c| !c.is_empty())
    .ok_or_else(|| ApiError::invalid("Please provide a course code.", BACK))?;
  let file = file
    .filter(|f| !f.is_empty())
    .ok_or_else(|| ApiError::invalid("Please choose a roster file to upload.", BACK))?;

  let rows = parse_roster(&file)
    .map_err(|e| ApiError::from_store(peerval_core::Error::from(e), BACK))?;

  let report = state
    .store
    .import_roster(session.user_id, CourseRef { code, name }, rows)
    .await
    .map_err(|e| ApiError::from_store(e, BACK))?;

  Ok(reply(report.summary(), DASHBOARD, json!({ "report": report })))
}

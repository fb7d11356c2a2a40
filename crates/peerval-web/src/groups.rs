//! Group formation and listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/creating-groups/{course_id}` | Enrolled students and existing groups |
//! | `POST` | `/creating-groups/{course_id}` | Body: `group_label`, `student_ids` (comma-separated) |
//! | `GET`  | `/groups-in-your-class` | All of the professor's groups |

use axum::{Json, extract::State};
use peerval_core::{
  group::GroupLabel,
  model::Course,
  store::PeerEvalStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, form_page, reply,
  error::ApiError,
  extract::{Form, Path},
  professor::DASHBOARD,
  session::{ProfessorSession, Session},
};

/// The course, if it exists and belongs to the signed-in professor.
async fn owned_course<S>(state: &AppState<S>, session: &Session, course_id: i64) -> Result<Course, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  state
    .store
    .course(course_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?
    .filter(|c| c.professor_id == session.user_id)
    .ok_or_else(|| ApiError::not_found("Course not found.", DASHBOARD))
}

/// `GET /creating-groups/{course_id}`
pub async fn form<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
  Path(course_id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let course = owned_course(&state, &session, course_id).await?;
  let students = state
    .store
    .enrolled_students(course_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;
  let groups = state
    .store
    .groups_for_course(course_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;

  Ok(form_page(
    &format!("/creating-groups/{course_id}"),
    &["group_label", "student_ids"],
    json!({ "course": course, "students": students, "groups": groups }),
  ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBody {
  pub group_label: String,
  pub student_ids: String,
}

/// Parse a comma-separated id list, ignoring blank entries.
fn parse_ids(raw: &str) -> Result<Vec<i64>, String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| s.parse().map_err(|_| format!("Student id {s:?} is not a number.")))
    .collect()
}

/// `POST /creating-groups/{course_id}`
///
/// Re-submitting the same label reuses the group and only adds missing
/// members.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
  Path(course_id): Path<i64>,
  Form(body): Form<CreateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let back = format!("/creating-groups/{course_id}");
  owned_course(&state, &session, course_id).await?;

  let label = GroupLabel::parse(&body.group_label).map_err(|e| ApiError::from_store(e, &back))?;
  let student_ids = parse_ids(&body.student_ids).map_err(|m| ApiError::invalid(m, &back))?;

  let formation = state
    .store
    .form_group(course_id, label, student_ids)
    .await
    .map_err(|e| ApiError::from_store(e, &back))?;

  let message = if formation.created {
    format!("Group {} created with {} members.", formation.group_name, formation.members_added)
  } else {
    format!("Group {} updated: {} members added.", formation.group_name, formation.members_added)
  };
  Ok(reply(message, "/groups-in-your-class", json!({ "group": formation })))
}

/// `GET /groups-in-your-class`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  ProfessorSession(session): ProfessorSession,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let groups = state
    .store
    .groups_for_professor(session.user_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?;

  Ok(Json(json!({ "groups": groups })))
}

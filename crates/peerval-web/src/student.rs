//! Student-facing handlers: the dashboard and the evaluation form.

use axum::{Json, extract::State};
use peerval_core::{
  rubric::{RatingsForm, RubricField, Score},
  store::PeerEvalStore,
};
use serde_json::{Value, json};

use crate::{
  AppState, reply,
  error::ApiError,
  extract::{Form, Path},
  notify::Event,
  session::StudentSession,
};

const DASHBOARD: &str = "/student-dashboard";

/// `GET /student-dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  StudentSession(session): StudentSession,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let evaluations = state
    .store
    .evaluations_for_evaluator(session.user_id)
    .await
    .map_err(|e| ApiError::from_store(e, "/"))?;

  Ok(Json(json!({
    "student":     { "student_id": session.user_id, "name": session.name, "email": session.email },
    "evaluations": evaluations,
  })))
}

/// `GET /peer_evaluation/{id}`
pub async fn evaluation<S>(
  State(state): State<AppState<S>>,
  StudentSession(session): StudentSession,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let detail = state
    .store
    .evaluation_for_evaluator(id, session.user_id)
    .await
    .map_err(|e| ApiError::from_store(e, DASHBOARD))?
    .ok_or_else(|| ApiError::not_found("Evaluation not found.", DASHBOARD))?;

  Ok(Json(json!({
    "evaluation": detail,
    "rubric": {
      "fields": RubricField::ALL,
      "min":    Score::MIN,
      "max":    Score::MAX,
    },
  })))
}

/// `POST /peer_evaluation/{id}`
///
/// Nothing is written unless all six ratings validate. A successful write is
/// followed by a best-effort webhook notification.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  StudentSession(session): StudentSession,
  Path(id): Path<i64>,
  Form(form): Form<RatingsForm>,
) -> Result<Json<Value>, ApiError>
where
  S: PeerEvalStore + Clone + 'static,
{
  let back = format!("/peer_evaluation/{id}");
  let scores = form
    .validate()
    .map_err(|e| ApiError::invalid(format!("Invalid rating: {e}."), &back))?;

  let affected = state
    .store
    .submit_scores(id, session.user_id, scores)
    .await
    .map_err(|e| ApiError::from_store(e, &back))?;
  if affected == 0 {
    return Err(ApiError::not_found("Evaluation not found.", DASHBOARD));
  }
  tracing::info!(peer_eval_id = id, student_id = session.user_id, "evaluation submitted");

  match state.store.evaluation_context(id).await {
    Ok(Some(ctx)) => {
      if let Some(event) = Event::submitted(ctx) {
        state.notifier.notify(event);
      }
    }
    Ok(None) => {}
    Err(e) => tracing::warn!(error = %e, peer_eval_id = id, "could not load notification context"),
  }

  Ok(reply("Evaluation submitted successfully!", DASHBOARD, json!({ "scores": scores })))
}

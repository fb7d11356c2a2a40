//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": <message>, "redirect": <path>}` so the
//! client always knows where to send the user next.

use axum::{
  Json,
  extract::{
    multipart::MultipartRejection,
    rejection::{FormRejection, PathRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use peerval_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

/// An error returned by a route handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Bad user input; the user is sent back to the form.
  #[error("{message}")]
  Invalid { message: String, redirect: String },

  #[error("{message}")]
  NotFound { message: String, redirect: String },

  #[error("{message}")]
  Conflict { message: String, redirect: String },

  #[error("{0}")]
  Unauthorized(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn invalid(message: impl Into<String>, redirect: impl Into<String>) -> Self {
    Self::Invalid { message: message.into(), redirect: redirect.into() }
  }

  pub fn not_found(message: impl Into<String>, redirect: impl Into<String>) -> Self {
    Self::NotFound { message: message.into(), redirect: redirect.into() }
  }

  /// Map a classified error. `redirect` is used for user-facing kinds.
  pub fn from_store<E>(err: E, redirect: impl Into<String>) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match err.kind() {
      ErrorKind::Invalid => Self::invalid(err.to_string(), redirect),
      ErrorKind::NotFound => Self::not_found(err.to_string(), redirect),
      ErrorKind::Conflict => Self::Conflict { message: err.to_string(), redirect: redirect.into() },
      ErrorKind::Internal => Self::Internal(Box::new(err)),
    }
  }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    if rejection.status().is_server_error() {
      return Self::Internal(Box::new(rejection));
    }
    Self::not_found("That page does not exist.", "/")
  }
}

impl From<FormRejection> for ApiError {
  fn from(rejection: FormRejection) -> Self {
    if rejection.status().is_server_error() {
      return Self::Internal(Box::new(rejection));
    }
    Self::invalid(format!("Could not read the form: {}", rejection.body_text()), "/")
  }
}

impl From<MultipartRejection> for ApiError {
  fn from(rejection: MultipartRejection) -> Self {
    Self::invalid(format!("Could not read the upload: {}", rejection.body_text()), "/")
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, redirect) = match self {
      ApiError::Invalid { message, redirect } => {
        (StatusCode::UNPROCESSABLE_ENTITY, message, redirect)
      }
      ApiError::NotFound { message, redirect } => (StatusCode::NOT_FOUND, message, redirect),
      ApiError::Conflict { message, redirect } => (StatusCode::CONFLICT, message, redirect),
      ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, "/login".into()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.into(), "/".into())
      }
    };
    (status, Json(json!({ "error": message, "redirect": redirect }))).into_response()
  }
}

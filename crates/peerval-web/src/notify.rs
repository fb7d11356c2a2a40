//! Best-effort webhook notifications.
//!
//! Each event is POSTed once as JSON with a `signature` field: the lowercase
//! hex SHA-256 of the event's identifiers joined with `:`, followed by `:` and
//! the shared secret. There is no retry; failures are logged and dropped.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use peerval_core::{
  model::{Course, EvaluationContext, Student},
  rubric::RubricScores,
};
use reqwest::Client;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("webhook request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("webhook answered with status {0}")]
  Rejected(u16),
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
  EvaluationSubmitted {
    peer_eval_id: i64,
    evaluator:    Student,
    evaluatee:    Student,
    course_code:  String,
    course_name:  String,
    scores:       RubricScores,
    submitted_at: DateTime<Utc>,
  },
  EvaluationsAssigned {
    course_id:   i64,
    course_code: String,
    course_name: String,
    due_date:    NaiveDate,
  },
}

impl Event {
  /// `None` unless the evaluation has been scored.
  pub fn submitted(ctx: EvaluationContext) -> Option<Self> {
    Some(Self::EvaluationSubmitted {
      peer_eval_id: ctx.peer_eval_id,
      scores:       ctx.scores?,
      submitted_at: ctx.submitted_at?,
      evaluator:    ctx.evaluator,
      evaluatee:    ctx.evaluatee,
      course_code:  ctx.course_code,
      course_name:  ctx.course_name,
    })
  }

  /// `None` unless the course has a due date.
  pub fn assigned(course: &Course) -> Option<Self> {
    Some(Self::EvaluationsAssigned {
      course_id:   course.course_id,
      course_code: course.course_code.clone(),
      course_name: course.course_name.clone(),
      due_date:    course.eval_due_date?,
    })
  }

  fn identifiers(&self) -> Vec<String> {
    match self {
      Self::EvaluationSubmitted { peer_eval_id, evaluator, evaluatee, .. } => vec![
        peer_eval_id.to_string(),
        evaluator.student_id.to_string(),
        evaluatee.student_id.to_string(),
      ],
      Self::EvaluationsAssigned { course_id, due_date, .. } => {
        vec![course_id.to_string(), due_date.to_string()]
      }
    }
  }

  fn name(&self) -> &'static str {
    match self {
      Self::EvaluationSubmitted { .. } => "evaluation_submitted",
      Self::EvaluationsAssigned { .. } => "evaluations_assigned",
    }
  }
}

/// Integrity token the receiver recomputes to authenticate a payload.
pub fn sign(identifiers: &[String], secret: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(identifiers.join(":").as_bytes());
  hasher.update(b":");
  hasher.update(secret.as_bytes());
  hex::encode(hasher.finalize())
}

#[derive(Serialize)]
struct Envelope<'a> {
  #[serde(flatten)]
  event:     &'a Event,
  signature: String,
}

// ─── Notifier ────────────────────────────────────────────────────────────────

struct Webhook {
  client: Client,
  url:    String,
  secret: String,
}

/// Delivers [`Event`]s to the configured webhook, if any.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Notifier {
  webhook: Option<Arc<Webhook>>,
}

impl Notifier {
  /// A notifier posting to `url`, or a disabled one when `url` is `None`.
  pub fn new(url: Option<String>, secret: String, timeout: Duration) -> Result<Self, NotifyError> {
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
      return Ok(Self::disabled());
    };
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { webhook: Some(Arc::new(Webhook { client, url, secret })) })
  }

  pub fn disabled() -> Self { Self { webhook: None } }

  pub fn is_enabled(&self) -> bool { self.webhook.is_some() }

  /// POST `event` once and wait for the answer.
  pub async fn deliver(&self, event: &Event) -> Result<(), NotifyError> {
    let Some(webhook) = &self.webhook else {
      tracing::debug!(event = event.name(), "webhook disabled, skipping notification");
      return Ok(());
    };

    let envelope = Envelope { event, signature: sign(&event.identifiers(), &webhook.secret) };
    let resp = webhook.client.post(&webhook.url).json(&envelope).send().await?;
    if !resp.status().is_success() {
      return Err(NotifyError::Rejected(resp.status().as_u16()));
    }
    tracing::debug!(event = event.name(), "webhook delivered");
    Ok(())
  }

  /// Deliver `event` on a background task. Failures are logged only.
  pub fn notify(&self, event: Event) {
    let notifier = self.clone();
    tokio::spawn(async move {
      if let Err(e) = notifier.deliver(&event).await {
        tracing::warn!(error = %e, event = event.name(), "webhook notification failed");
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{Json, Router, extract::State, routing::post};
  use tokio::{net::TcpListener, sync::mpsc};

  fn student(id: i64, name: &str) -> Student {
    Student { student_id: id, name: name.into(), email: format!("{id}@uni.edu") }
  }

  fn assigned_event() -> Event {
    Event::EvaluationsAssigned {
      course_id:   7,
      course_code: "CS101".into(),
      course_name: "Intro".into(),
      due_date:    NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
    }
  }

  /// Bind a loopback receiver that forwards each JSON body to a channel.
  async fn receiver(status: u16) -> (String, mpsc::Receiver<serde_json::Value>) {
    let (tx, rx) = mpsc::channel(4);
    let app = Router::new()
      .route(
        "/hook",
        post(move |State(tx): State<mpsc::Sender<serde_json::Value>>, Json(body): Json<serde_json::Value>| async move {
          tx.send(body).await.ok();
          axum::http::StatusCode::from_u16(status).unwrap()
        }),
      )
      .with_state(tx);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/hook"), rx)
  }

  #[test]
  fn signature_is_lowercase_hex_sha256() {
    let sig = sign(&["12".into(), "1001".into(), "1002".into()], "s3cret");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_eq!(sig, sign(&["12".into(), "1001".into(), "1002".into()], "s3cret"));
    assert_ne!(sig, sign(&["12".into(), "1001".into(), "1002".into()], "other"));
    assert_ne!(sig, sign(&["121".into(), "001".into(), "1002".into()], "s3cret"));
  }

  #[test]
  fn unscored_context_builds_no_event() {
    let ctx = EvaluationContext {
      peer_eval_id: 1,
      evaluator:    student(1001, "Ada"),
      evaluatee:    student(1002, "Alan"),
      course_id:    7,
      course_code:  "CS101".into(),
      course_name:  "Intro".into(),
      scores:       None,
      submitted_at: None,
    };
    assert!(Event::submitted(ctx).is_none());
  }

  #[tokio::test]
  async fn delivers_signed_payload() {
    let (url, mut rx) = receiver(200).await;
    let notifier = Notifier::new(Some(url), "s3cret".into(), Duration::from_secs(5)).unwrap();

    notifier.deliver(&assigned_event()).await.unwrap();

    let body = rx.recv().await.unwrap();
    assert_eq!(body["event"], "evaluations_assigned");
    assert_eq!(body["course_code"], "CS101");
    assert_eq!(body["due_date"], "2025-05-01");
    assert_eq!(body["signature"], sign(&["7".into(), "2025-05-01".into()], "s3cret"));
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let (url, _rx) = receiver(500).await;
    let notifier = Notifier::new(Some(url), "s3cret".into(), Duration::from_secs(5)).unwrap();
    let err = notifier.deliver(&assigned_event()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Rejected(500)));
  }

  #[tokio::test]
  async fn unreachable_webhook_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier =
      Notifier::new(Some(format!("http://{addr}/hook")), "s".into(), Duration::from_secs(1)).unwrap();
    assert!(matches!(
      notifier.deliver(&assigned_event()).await,
      Err(NotifyError::Request(_))
    ));
  }

  #[tokio::test]
  async fn disabled_notifier_is_a_no_op() {
    let notifier = Notifier::new(None, String::new(), Duration::from_secs(5)).unwrap();
    assert!(!notifier.is_enabled());
    notifier.deliver(&assigned_event()).await.unwrap();
  }
}

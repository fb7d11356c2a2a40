//! Router tests driving the full application through `tower::ServiceExt::oneshot`.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Request, StatusCode, header},
};
use peerval_core::{model::NewProfessor, store::PeerEvalStore};
use peerval_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, notify::Notifier, reply, router, session::SessionStore};

const BOUNDARY: &str = "peerval-test-boundary";

async fn make_state() -> AppState<SqliteStore> {
  make_state_with(SessionStore::default(), Notifier::disabled()).await
}

async fn make_state_with(sessions: SessionStore, notifier: Notifier) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .add_professor(NewProfessor {
      name:       "Dr. Knuth".into(),
      email:      "knuth@uni.edu".into(),
      password:   "taocp".into(),
      department: None,
    })
    .await
    .unwrap();

  AppState {
    store:    Arc::new(store),
    sessions,
    notifier,
    config:   Arc::new(ServerConfig::default()),
  }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, headers, body)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder().method("GET").uri(uri);
  if let Some(cookie) = cookie {
    builder = builder.header(header::COOKIE, cookie);
  }
  builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
  let mut builder = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
  if let Some(cookie) = cookie {
    builder = builder.header(header::COOKIE, cookie);
  }
  builder.body(Body::from(body.to_string())).unwrap()
}

fn post_roster(cookie: &str, code: &str, csv: &str) -> Request<Body> {
  let body = format!(
    "--{BOUNDARY}\r\n\
     Content-Disposition: form-data; name=\"course_code\"\r\n\r\n\
     {code}\r\n\
     --{BOUNDARY}\r\n\
     Content-Disposition: form-data; name=\"file\"; filename=\"roster.csv\"\r\n\
     Content-Type: text/csv\r\n\r\n\
     {csv}\r\n\
     --{BOUNDARY}--\r\n"
  );
  Request::builder()
    .method("POST")
    .uri("/import-course-roster")
    .header(header::COOKIE, cookie)
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
    .body(Body::from(body))
    .unwrap()
}

/// Log in and return the `name=value` pair to send back as a cookie.
async fn login(app: &Router, body: &str) -> String {
  let (status, headers, _) = send(app, post_form("/login", None, body)).await;
  assert_eq!(status, StatusCode::OK);
  let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
  assert!(set_cookie.contains("HttpOnly"));
  set_cookie.split(';').next().unwrap().to_string()
}

async fn professor_cookie(app: &Router) -> String {
  login(app, "email=knuth%40uni.edu&password=taocp&user_type=professor").await
}

const ROSTER: &str = "Student ID,Name,Email\n\
                      1001,Ada Lovelace,ada@uni.edu\n\
                      1002,Alan Turing,alan@uni.edu\n\
                      1003,Grace Hopper,\n";

// ── Public pages ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_returns_banner() {
  let app = router(make_state().await);
  let (status, _, body) = send(&app, get("/", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["service"], "peerval");
}

#[tokio::test]
async fn login_form_lists_fields() {
  let app = router(make_state().await);
  let (status, _, body) = send(&app, get("/login", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["fields"][2], "user_type");
}

// ── Auth ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn protected_routes_require_a_session() {
  let app = router(make_state().await);
  for uri in ["/student-dashboard", "/professor-dashboard", "/groups-in-your-class"] {
    let (status, _, body) = send(&app, get(uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    assert_eq!(body["redirect"], "/login");
  }
}

#[tokio::test]
async fn wrong_professor_password_is_rejected() {
  let app = router(make_state().await);
  let (status, headers, body) = send(
    &app,
    post_form("/login", None, "email=knuth%40uni.edu&password=nope&user_type=professor"),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(!headers.contains_key(header::SET_COOKIE));
  assert_eq!(body["error"], "Invalid email or password.");
}

#[tokio::test]
async fn signup_then_student_login() {
  let app = router(make_state().await);

  let (status, _, body) =
    send(&app, post_form("/signup", None, "name=Ada+Lovelace&email=ada%40uni.edu")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["redirect"], "/login");

  let (status, _, body) =
    send(&app, post_form("/signup", None, "name=Ada&email=ada%40uni.edu")).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["redirect"], "/signup");

  let cookie = login(&app, "email=ada%40uni.edu&password=&user_type=student").await;
  let (status, _, body) = send(&app, get("/student-dashboard", Some(&cookie))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["student"]["name"], "Ada Lovelace");
  assert_eq!(body["evaluations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn get_started_joins_names() {
  let app = router(make_state().await);
  let (status, _, body) = send(
    &app,
    post_form("/get-started", None, "fname=Grace&lname=Hopper&email=grace%40uni.edu"),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["student"]["name"], "Grace Hopper");
}

#[tokio::test]
async fn login_cookie_expires_with_the_session() {
  let app = router(make_state().await);
  let (_, headers, _) = send(
    &app,
    post_form("/login", None, "email=knuth%40uni.edu&password=taocp&user_type=professor"),
  )
  .await;
  let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
  assert!(set_cookie.contains("Max-Age=28800"), "{set_cookie}");
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
  let app = router(make_state_with(SessionStore::new(Duration::ZERO), Notifier::disabled()).await);
  let cookie = professor_cookie(&app).await;

  let (status, _, body) = send(&app, get("/professor-dashboard", Some(&cookie))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn repeated_logins_do_not_accumulate_expired_sessions() {
  let state = make_state_with(SessionStore::new(Duration::ZERO), Notifier::disabled()).await;
  let app = router(state.clone());
  for _ in 0..50 {
    professor_cookie(&app).await;
  }
  assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn logout_ends_the_session() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;

  let (status, headers, _) = send(&app, get("/logout", Some(&cookie))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().contains("Max-Age=0"));

  let (status, _, _) = send(&app, get("/professor-dashboard", Some(&cookie))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Professor flows ────────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_upload_reports_summary() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;

  let (status, _, body) = send(&app, post_roster(&cookie, "CS101", ROSTER)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body["message"],
    "Imported roster for CS101: 2 students added, 2 enrollments added, 1 row skipped."
  );
  assert_eq!(body["report"]["skipped"][0]["reason"]["kind"], "missing_field");

  let (_, _, body) = send(&app, post_roster(&cookie, "CS101", ROSTER)).await;
  assert_eq!(body["report"]["enrollments_added"], 0);
}

#[tokio::test]
async fn roster_without_required_columns_is_invalid() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;

  let (status, _, body) = send(&app, post_roster(&cookie, "CS101", "id,name\n1,Ada\n")).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["redirect"], "/import-course-roster");
}

#[tokio::test]
async fn groups_are_formed_idempotently() {
  let state = make_state().await;
  let app = router(state.clone());
  let cookie = professor_cookie(&app).await;
  let (_, _, body) = send(&app, post_roster(&cookie, "CS101", ROSTER)).await;
  let course_id = body["report"]["course_id"].as_i64().unwrap();
  let uri = format!("/creating-groups/{course_id}");

  let (status, _, body) =
    send(&app, post_form(&uri, Some(&cookie), "group_label=Group+1&student_ids=1001%2C1002")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["group"]["group_name"], "CS101-Group1");
  assert_eq!(body["group"]["members_added"], 2);

  let (_, _, body) =
    send(&app, post_form(&uri, Some(&cookie), "group_label=Group+1&student_ids=1001%2C1002")).await;
  assert_eq!(body["group"]["members_added"], 0);

  let (status, _, body) =
    send(&app, post_form(&uri, Some(&cookie), "group_label=Group+2&student_ids=")).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["redirect"], uri);

  let (_, _, body) = send(&app, get("/groups-in-your-class", Some(&cookie))).await;
  assert_eq!(body["groups"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn another_professors_course_is_not_found() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;

  let (status, _, body) = send(&app, get("/creating-groups/999", Some(&cookie))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["redirect"], "/professor-dashboard");

  let (status, _, _) = send(&app, get("/course-analysis/999", Some(&cookie))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assign_evaluations_validates_the_date() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;
  let (_, _, body) = send(&app, post_roster(&cookie, "CS101", ROSTER)).await;
  let course_id = body["report"]["course_id"].as_i64().unwrap();

  let (status, _, _) = send(
    &app,
    post_form("/assign-evaluations", Some(&cookie), &format!("course_id={course_id}&due_date=soon")),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _, body) = send(
    &app,
    post_form(
      "/assign-evaluations",
      Some(&cookie),
      &format!("course_id={course_id}&due_date=2025-05-01"),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["course"]["eval_due_date"], "2025-05-01");
}

// ── Evaluation submission ──────────────────────────────────────────────────────

/// Import, group Ada and Alan, open evaluations, and log Ada in.
async fn evaluation_setup() -> (AppState<SqliteStore>, Router, String, i64) {
  evaluation_setup_with(Notifier::disabled()).await
}

async fn evaluation_setup_with(notifier: Notifier) -> (AppState<SqliteStore>, Router, String, i64) {
  let state = make_state_with(SessionStore::default(), notifier).await;
  let app = router(state.clone());
  let prof = professor_cookie(&app).await;
  let (_, _, body) = send(&app, post_roster(&prof, "CS101", ROSTER)).await;
  let course_id = body["report"]["course_id"].as_i64().unwrap();
  send(
    &app,
    post_form(
      &format!("/creating-groups/{course_id}"),
      Some(&prof),
      "group_label=Group+1&student_ids=1001%2C1002",
    ),
  )
  .await;
  state.store.open_group_evaluations(course_id).await.unwrap();

  let ada = login(&app, "email=ada%40uni.edu&user_type=student").await;
  let (_, _, body) = send(&app, get("/student-dashboard", Some(&ada))).await;
  let eval_id = body["evaluations"][0]["peer_eval_id"].as_i64().unwrap();
  (state, app, ada, eval_id)
}

const VALID_RATINGS: &str =
  "contribution=4&collaboration=3&communication=2&planning=1&inclusivity=0&overall=3";

#[tokio::test]
async fn out_of_range_rating_writes_nothing() {
  let (state, app, ada, eval_id) = evaluation_setup().await;
  let uri = format!("/peer_evaluation/{eval_id}");

  let (status, _, body) = send(
    &app,
    post_form(
      &uri,
      Some(&ada),
      "contribution=4&collaboration=0&communication=5&planning=2&inclusivity=1&overall=3",
    ),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["redirect"], uri);
  assert!(body["error"].as_str().unwrap().contains("communication"));

  let detail = state.store.evaluation_for_evaluator(eval_id, 1001).await.unwrap().unwrap();
  assert!(detail.scores.is_none());
}

#[tokio::test]
async fn valid_ratings_are_saved() {
  let (state, app, ada, eval_id) = evaluation_setup().await;
  let uri = format!("/peer_evaluation/{eval_id}");

  let (status, _, body) = send(&app, get(&uri, Some(&ada))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["evaluation"]["evaluatee_name"], "Alan Turing");
  assert_eq!(body["rubric"]["fields"][0], "contribution");

  let (status, _, body) = send(&app, post_form(&uri, Some(&ada), VALID_RATINGS)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["redirect"], "/student-dashboard");

  let detail = state.store.evaluation_for_evaluator(eval_id, 1001).await.unwrap().unwrap();
  assert_eq!(detail.scores.unwrap().communication.get(), 2);

  let (_, _, body) = send(&app, get("/student-dashboard", Some(&ada))).await;
  assert_eq!(body["evaluations"][0]["submitted"], true);
}

#[tokio::test]
async fn unreachable_webhook_does_not_block_submission() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  let notifier =
    Notifier::new(Some(format!("http://{addr}/hook")), "s3cret".into(), Duration::from_secs(1))
      .unwrap();
  assert!(notifier.is_enabled());

  let (state, app, ada, eval_id) = evaluation_setup_with(notifier).await;
  let (status, _, body) =
    send(&app, post_form(&format!("/peer_evaluation/{eval_id}"), Some(&ada), VALID_RATINGS)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["redirect"], "/student-dashboard");

  let detail = state.store.evaluation_for_evaluator(eval_id, 1001).await.unwrap().unwrap();
  let scores = detail.scores.unwrap();
  assert_eq!(scores.contribution.get(), 4);
  assert_eq!(scores.inclusivity.get(), 0);
}

#[tokio::test]
async fn non_numeric_evaluation_id_is_a_json_error() {
  let (_, app, ada, _) = evaluation_setup().await;

  let (status, headers, body) = send(&app, get("/peer_evaluation/abc", Some(&ada))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(headers[header::CONTENT_TYPE], "application/json");
  assert_eq!(body["redirect"], "/");
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn unreadable_form_is_a_json_error() {
  let (state, app, ada, eval_id) = evaluation_setup().await;
  let uri = format!("/peer_evaluation/{eval_id}");

  let req = Request::builder()
    .method("POST")
    .uri(&uri)
    .header(header::COOKIE, &ada)
    .body(Body::from(VALID_RATINGS))
    .unwrap();
  let (status, _, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["redirect"], "/");
  assert!(body["error"].as_str().unwrap().starts_with("Could not read the form"));

  let detail = state.store.evaluation_for_evaluator(eval_id, 1001).await.unwrap().unwrap();
  assert!(detail.scores.is_none());
}

#[tokio::test]
async fn roster_upload_without_multipart_is_a_json_error() {
  let app = router(make_state().await);
  let cookie = professor_cookie(&app).await;

  let (status, _, body) =
    send(&app, post_form("/import-course-roster", Some(&cookie), "course_code=CS101")).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().starts_with("Could not read the upload"));
}

#[tokio::test]
async fn submitting_to_a_missing_evaluation_is_not_found() {
  let (_, app, ada, _) = evaluation_setup().await;
  let (status, _, body) =
    send(&app, post_form("/peer_evaluation/9999", Some(&ada), VALID_RATINGS)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["redirect"], "/student-dashboard");
}

#[tokio::test]
async fn professors_cannot_submit_evaluations() {
  let (_, app, _, eval_id) = evaluation_setup().await;
  let prof = professor_cookie(&app).await;
  let (status, _, _) = send(
    &app,
    post_form(&format!("/peer_evaluation/{eval_id}"), Some(&prof), VALID_RATINGS),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn analysis_reflects_submissions() {
  let (state, app, ada, eval_id) = evaluation_setup().await;
  send(&app, post_form(&format!("/peer_evaluation/{eval_id}"), Some(&ada), VALID_RATINGS)).await;

  let course_id = state.store.evaluation_context(eval_id).await.unwrap().unwrap().course_id;
  let prof = professor_cookie(&app).await;
  let (status, _, body) = send(&app, get(&format!("/course-analysis/{course_id}"), Some(&prof))).await;
  assert_eq!(status, StatusCode::OK);

  let analysis = body["analysis"].as_array().unwrap();
  let alan = analysis.iter().find(|a| a["student_id"] == 1002).unwrap();
  assert_eq!(alan["submitted"], 1);
  assert_eq!(alan["averages"]["contribution"], 4.0);

  let (_, _, body) = send(&app, get("/professor-dashboard", Some(&prof))).await;
  assert_eq!(body["courses"][0]["evaluations_submitted"], 1);
}

// ── Reply helpers ──────────────────────────────────────────────────────────────

#[test]
fn reply_merges_object_data_only() {
  let axum::Json(body) = reply("Saved.", "/home", json!({ "count": 2 }));
  assert_eq!(body, json!({ "message": "Saved.", "redirect": "/home", "count": 2 }));

  let axum::Json(body) = reply("Saved.", "/home", Value::Null);
  assert_eq!(body, json!({ "message": "Saved.", "redirect": "/home" }));
}

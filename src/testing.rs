//! Test utilities: an in-process stand-in for the e-learning backend.
//!
//! [`MockBackend`] binds an ephemeral port and serves the REST endpoints the
//! client talks to, wrapped in the `{status, message, data}` envelope, from
//! fixture data held in memory. Tests talk to it over real HTTP.
//!
//! Fixtures:
//! - topic 7 "Greetings" with sub-units 42 (7 cards, no grouping) and
//!   43 (4 cards, grouping `0-2`, `2-4`, no sentence drills of its own)
//! - learner (`LEARNER_TOKEN`) and admin (`ADMIN_TOKEN`) accounts
//! - anything else answers 404

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use axum_test::TestServer;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::domain::{Profile, ProgressState, Role, UserAccount};
use crate::state::AppState;

pub const LEARNER_TOKEN: &str = "learner-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const LEARNER_EMAIL: &str = "learner@example.com";
pub const LEARNER_PASSWORD: &str = "learner-pass1";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass1";
pub const RESET_TOKEN: &str = "reset-token";

pub const LEARNER_ID: i64 = 1;
/// Admin searches for this term answer after a delay
pub const SLOW_SEARCH: &str = "slow";
const ADMIN_ID: i64 = 100;

type Shared = Arc<Mutex<MockData>>;
type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
  (
    StatusCode::OK,
    Json(json!({ "status": 200, "message": "OK", "data": data })),
  )
}

fn ok_message(message: &str) -> Reply {
  (
    StatusCode::OK,
    Json(json!({ "status": 200, "message": message, "data": null })),
  )
}

fn fail(status: StatusCode, message: &str) -> Reply {
  (
    status,
    Json(json!({ "status": status.as_u16(), "message": message, "data": null })),
  )
}

fn not_found() -> Reply {
  fail(StatusCode::NOT_FOUND, "Not found")
}

struct MockData {
  progress: HashMap<i64, ProgressState>,
  last_progress_body: Option<Value>,
  completed: Vec<i64>,
  profiles: HashMap<&'static str, Profile>,
  users: Vec<UserAccount>,
  next_user_id: i64,
}

impl MockData {
  fn seeded() -> Self {
    let profiles = HashMap::from([
      (
        LEARNER_TOKEN,
        Profile {
          username: "learner".to_string(),
          email: LEARNER_EMAIL.to_string(),
          ..Default::default()
        },
      ),
      (
        ADMIN_TOKEN,
        Profile {
          username: "admin".to_string(),
          email: ADMIN_EMAIL.to_string(),
          ..Default::default()
        },
      ),
    ]);
    let account = |id: i64, username: &str, role: Role| UserAccount {
      id,
      username: username.to_string(),
      email: format!("{}@example.com", username.replace(' ', ".")),
      role,
      active: true,
    };
    Self {
      progress: HashMap::new(),
      last_progress_body: None,
      completed: Vec::new(),
      profiles,
      users: vec![
        account(LEARNER_ID, "learner", Role::Learner),
        account(2, "mar ia", Role::Learner),
        account(3, "maker one", Role::Creator),
        account(4, "checker", Role::Approver),
      ],
      next_user_id: 10,
    }
  }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

/// Which fixture account a token belongs to
fn caller(headers: &HeaderMap) -> Result<(&'static str, i64, Role), Reply> {
  match bearer(headers) {
    Some(LEARNER_TOKEN) => Ok((LEARNER_TOKEN, LEARNER_ID, Role::Learner)),
    Some(ADMIN_TOKEN) => Ok((ADMIN_TOKEN, ADMIN_ID, Role::Admin)),
    Some(_) => Err(fail(StatusCode::UNAUTHORIZED, "Session expired")),
    None => Err(fail(StatusCode::UNAUTHORIZED, "Authentication required")),
  }
}

fn require_admin(headers: &HeaderMap) -> Result<(), Reply> {
  match caller(headers)? {
    (_, _, Role::Admin) => Ok(()),
    _ => Err(fail(StatusCode::FORBIDDEN, "Admin access required")),
  }
}

// ============================================================================
// Content fixtures
// ============================================================================

const WORDS_42: [&str; 7] = ["hello", "thanks", "please", "sorry", "yes", "no", "goodbye"];
const WORDS_43: [&str; 4] = ["excuse me", "welcome", "friend", "family"];

fn cards(subtopic_id: i64) -> Option<Value> {
  let (words, base): (&[&str], i64) = match subtopic_id {
    42 => (&WORDS_42, 100),
    43 => (&WORDS_43, 200),
    _ => return None,
  };
  let cards: Vec<Value> = words
    .iter()
    .enumerate()
    .map(|(i, word)| {
      json!({
        "id": base + i as i64 + 1,
        "word": word,
        "videoUrl": format!("/media/{}.mp4", word.replace(' ', "-")),
      })
    })
    .collect();
  Some(Value::Array(cards))
}

fn choice(id: i64, correct: &str, options: &[&str]) -> Value {
  json!({
    "id": id,
    "videoUrl": format!("/media/{}.mp4", correct),
    "options": options.iter().map(|o| json!({ "text": o })).collect::<Vec<_>>(),
    "correctAnswer": correct,
  })
}

fn sentence(id: i64, words: &[&str], correct: &str) -> Value {
  json!({ "id": id, "words": words, "correctSentence": correct })
}

async fn topics() -> Reply {
  ok(json!([{
    "id": 7,
    "title": "Greetings",
    "subtopics": [
      { "id": 42, "title": "Basics" },
      { "id": 43, "title": "Polite words" },
    ],
  }]))
}

async fn flashcards(Path(id): Path<i64>) -> Reply {
  cards(id).map(ok).unwrap_or_else(not_found)
}

async fn practice(Path(id): Path<i64>) -> Reply {
  match id {
    42 => ok(json!([
      choice(11, "hello", &["hello", "thanks", "sorry"]),
      choice(12, "thanks", &["please", "thanks", "no"]),
    ])),
    43 => ok(json!([choice(21, "friend", &["friend", "family"])])),
    44 => ok(json!([])),
    _ => not_found(),
  }
}

async fn subtopic_sentences(Path(id): Path<i64>) -> Reply {
  match id {
    42 => ok(json!([sentence(31, &["you", "thank"], "thank you")])),
    43 | 44 => ok(json!([])),
    _ => not_found(),
  }
}

async fn topic_sentences(Path(id): Path<i64>) -> Reply {
  match id {
    7 => ok(json!([
      sentence(41, &["friend", "my", "hello"], "hello my friend"),
      sentence(42, &["welcome", "you", "are"], "you are welcome"),
    ])),
    _ => not_found(),
  }
}

async fn timeline(Path(id): Path<i64>) -> Reply {
  match id {
    42 => ok(Value::Null),
    43 => ok(json!({ "groups": [{ "start": 0, "end": 2 }, { "start": 2, "end": 4 }] })),
    _ => not_found(),
  }
}

async fn next_subtopic(Path(id): Path<i64>) -> Reply {
  match id {
    42 => ok(json!({ "nextSubtopicId": 43, "topicId": 7 })),
    43 => ok(json!({ "nextSubtopicId": null, "topicId": 7 })),
    _ => not_found(),
  }
}

async fn topic_subtopics(Path(id): Path<i64>) -> Reply {
  match id {
    7 => ok(json!([{ "id": 42, "title": "Basics" }, { "id": 43, "title": "Polite words" }])),
    _ => not_found(),
  }
}

async fn completed_subtopics(State(data): State<Shared>, headers: HeaderMap) -> Reply {
  if let Err(reply) = caller(&headers) {
    return reply;
  }
  let data = data.lock().expect("mock lock");
  ok(json!(data.completed))
}

// ============================================================================
// Progress
// ============================================================================

async fn load_progress(
  State(data): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Reply {
  if let Err(reply) = caller(&headers) {
    return reply;
  }
  let data = data.lock().expect("mock lock");
  match data.progress.get(&id) {
    Some(progress) => ok(json!(progress)),
    None => fail(StatusCode::NOT_FOUND, "No progress recorded"),
  }
}

async fn save_progress(
  State(data): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
  Json(body): Json<Value>,
) -> Reply {
  if let Err(reply) = caller(&headers) {
    return reply;
  }
  let Ok(incoming) = serde_json::from_value::<ProgressState>(body.clone()) else {
    return fail(StatusCode::BAD_REQUEST, "Malformed progress");
  };
  let mut data = data.lock().expect("mock lock");
  data.last_progress_body = Some(body);
  let stored = data.progress.entry(id).or_default();
  stored.merge(&incoming);
  let merged = stored.clone();
  ok(json!(merged))
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Deserialize)]
struct Credentials {
  email: String,
  password: String,
}

async fn sign_in(Json(body): Json<Credentials>) -> Reply {
  match (body.email.as_str(), body.password.as_str()) {
    (LEARNER_EMAIL, LEARNER_PASSWORD) => ok(json!({
      "token": LEARNER_TOKEN,
      "user": { "id": LEARNER_ID, "username": "learner", "email": LEARNER_EMAIL, "role": "learner" },
    })),
    (ADMIN_EMAIL, ADMIN_PASSWORD) => ok(json!({
      "token": ADMIN_TOKEN,
      "user": { "id": ADMIN_ID, "username": "admin", "email": ADMIN_EMAIL, "role": "admin" },
    })),
    _ => fail(StatusCode::UNAUTHORIZED, "Invalid email or password"),
  }
}

async fn sign_up(Json(body): Json<Value>) -> Reply {
  match body["email"].as_str() {
    Some(LEARNER_EMAIL) | Some(ADMIN_EMAIL) => fail(StatusCode::CONFLICT, "Email already used"),
    Some(_) => ok_message("Account created"),
    None => fail(StatusCode::BAD_REQUEST, "Email is required"),
  }
}

async fn forgot_password() -> Reply {
  ok_message("If the address exists, a reset link is on its way")
}

async fn reset_password(Json(body): Json<Value>) -> Reply {
  if body["token"].as_str() == Some(RESET_TOKEN) {
    ok_message("Password updated")
  } else {
    fail(StatusCode::BAD_REQUEST, "Invalid or expired reset token")
  }
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
  let expected = match caller(&headers) {
    Ok((_, _, Role::Admin)) => ADMIN_PASSWORD,
    Ok(_) => LEARNER_PASSWORD,
    Err(reply) => return reply,
  };
  if body["currentPassword"].as_str() == Some(expected) {
    ok_message("Password changed")
  } else {
    fail(StatusCode::BAD_REQUEST, "Current password is incorrect")
  }
}

async fn profile(State(data): State<Shared>, headers: HeaderMap) -> Reply {
  let token = match caller(&headers) {
    Ok((token, _, _)) => token,
    Err(reply) => return reply,
  };
  let data = data.lock().expect("mock lock");
  ok(json!(data.profiles.get(token)))
}

async fn update_profile(
  State(data): State<Shared>,
  headers: HeaderMap,
  Json(body): Json<Profile>,
) -> Reply {
  let token = match caller(&headers) {
    Ok((token, _, _)) => token,
    Err(reply) => return reply,
  };
  let mut data = data.lock().expect("mock lock");
  data.profiles.insert(token, body.clone());
  ok(json!(body))
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Deserialize)]
struct UserQuery {
  role: String,
  search: Option<String>,
}

async fn list_users(
  State(data): State<Shared>,
  headers: HeaderMap,
  Query(query): Query<UserQuery>,
) -> Reply {
  if let Err(reply) = require_admin(&headers) {
    return reply;
  }
  let Some(role) = Role::from_str(&query.role) else {
    return fail(StatusCode::BAD_REQUEST, "Unknown role");
  };
  if query.search.as_deref() == Some(SLOW_SEARCH) {
    tokio::time::sleep(Duration::from_millis(300)).await;
  }
  let data = data.lock().expect("mock lock");
  let users: Vec<&UserAccount> = data
    .users
    .iter()
    .filter(|u| u.role == role)
    .filter(|u| query.search.as_deref().is_none_or(|s| u.username.contains(s)))
    .collect();
  ok(json!(users))
}

#[derive(Deserialize)]
struct NewUser {
  username: String,
  email: String,
  role: Role,
}

async fn create_user(
  State(data): State<Shared>,
  headers: HeaderMap,
  Json(body): Json<NewUser>,
) -> Reply {
  if let Err(reply) = require_admin(&headers) {
    return reply;
  }
  let mut data = data.lock().expect("mock lock");
  if data.users.iter().any(|u| u.email == body.email) {
    return fail(StatusCode::CONFLICT, "Email already used");
  }
  let account = UserAccount {
    id: data.next_user_id,
    username: body.username,
    email: body.email,
    role: body.role,
    active: true,
  };
  data.next_user_id += 1;
  data.users.push(account.clone());
  ok(json!(account))
}

#[derive(Deserialize)]
struct StatusBody {
  active: bool,
}

async fn set_status(
  State(data): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
  Json(body): Json<StatusBody>,
) -> Reply {
  if let Err(reply) = require_admin(&headers) {
    return reply;
  }
  let mut data = data.lock().expect("mock lock");
  match data.users.iter_mut().find(|u| u.id == id) {
    Some(user) => {
      user.active = body.active;
      ok(json!(user))
    }
    None => fail(StatusCode::NOT_FOUND, "User not found"),
  }
}

// ============================================================================
// Unit test
// ============================================================================

async fn topic_test(Path(id): Path<i64>) -> Reply {
  if id != 7 {
    return not_found();
  }
  let mut first = choice(1, "hello", &["hello", "goodbye", "friend"]);
  first["type"] = json!("multiple-choice");
  let mut second = sentence(2, &["you", "thank"], "thank you");
  second["type"] = json!("sentence-building");
  ok(json!([first, second]))
}

async fn submit_test(Path(id): Path<i64>, Json(body): Json<Value>) -> Reply {
  if id != 7 {
    return not_found();
  }
  let key = [(1, "hello"), (2, "thank you")];
  let answers = body["answers"].as_array().cloned().unwrap_or_default();
  let score = key
    .iter()
    .filter(|(question, correct)| {
      answers.iter().any(|a| {
        a["questionId"].as_i64() == Some(*question) && a["answer"].as_str() == Some(*correct)
      })
    })
    .count();
  ok(json!({ "score": score, "total": key.len(), "passed": score * 2 >= key.len() }))
}

fn router(data: Shared) -> Router {
  Router::new()
    .route("/users/signin", post(sign_in))
    .route("/users/signup", post(sign_up))
    .route("/users/forgot-password", post(forgot_password))
    .route("/users/reset-password", post(reset_password))
    .route("/users/change-password", post(change_password))
    .route("/users/profile", get(profile).put(update_profile))
    .route("/api/v1/flashcards/topics", get(topics))
    .route("/api/v1/flashcards/completed-subtopics", get(completed_subtopics))
    .route("/api/v1/flashcards/subtopic/{id}", get(flashcards))
    .route("/api/v1/flashcards/subtopic/{id}/practice", get(practice))
    .route("/api/v1/flashcards/subtopic/{id}/sentence-building", get(subtopic_sentences))
    .route("/api/v1/flashcards/subtopic/{id}/timeline", get(timeline))
    .route("/api/v1/flashcards/subtopic/{id}/next-subtopic", get(next_subtopic))
    .route(
      "/api/v1/flashcards/subtopic/{id}/progress",
      get(load_progress).post(save_progress),
    )
    .route("/api/v1/flashcards/topic/{id}/subtopics", get(topic_subtopics))
    .route("/api/v1/flashcards/topic/{id}/sentence-building", get(topic_sentences))
    .route("/api/v1/flashcards/topic/{id}/test", get(topic_test))
    .route("/api/v1/flashcards/topic/{id}/test/submit", post(submit_test))
    .route("/api/v1/admin/users", get(list_users).post(create_user))
    .route("/api/v1/admin/users/{id}/status", put(set_status))
    .with_state(data)
}

/// Running mock backend; the server task stops when this is dropped.
pub struct MockBackend {
  base_url: String,
  data: Shared,
  server: JoinHandle<()>,
}

impl MockBackend {
  pub async fn start() -> Self {
    let data: Shared = Arc::new(Mutex::new(MockData::seeded()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    let app = router(data.clone());
    let server = tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });
    Self {
      base_url: format!("http://{}", addr),
      data,
      server,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Anonymous client pointed at this backend
  pub fn client(&self) -> ApiClient {
    ApiClient::new(&self.base_url, Duration::from_secs(5)).expect("mock client")
  }

  /// Last progress body the backend accepted
  pub fn last_progress_body(&self) -> Option<Value> {
    self.data.lock().expect("mock lock").last_progress_body.clone()
  }

  /// Stored progress record for a sub-unit
  pub fn progress(&self, subtopic_id: i64) -> Option<ProgressState> {
    self.data.lock().expect("mock lock").progress.get(&subtopic_id).cloned()
  }

  pub fn complete_subtopic(&self, subtopic_id: i64) {
    self.data.lock().expect("mock lock").completed.push(subtopic_id);
  }

  pub fn is_active(&self, user_id: i64) -> Option<bool> {
    let data = self.data.lock().expect("mock lock");
    data.users.iter().find(|u| u.id == user_id).map(|u| u.active)
  }
}

impl Drop for MockBackend {
  fn drop(&mut self) {
    self.server.abort();
  }
}

/// App state wired to a mock backend
pub fn app_state(backend: &MockBackend) -> AppState {
  let config = AppConfig {
    api_base_url: backend.base_url().to_string(),
    ..AppConfig::default()
  };
  AppState::new(config).expect("app state")
}

/// Test server for the full router that keeps cookies between requests
pub fn test_server(backend: &MockBackend) -> TestServer {
  TestServer::builder()
    .save_cookies()
    .build(crate::handlers::router(app_state(backend)))
    .expect("test server")
}

/// Test server with a session already signed in
pub async fn signed_in_server(backend: &MockBackend, email: &str, password: &str) -> TestServer {
  let server = test_server(backend);
  server
    .post("/login")
    .form(&[("email", email), ("password", password)])
    .await
    .assert_status(StatusCode::SEE_OTHER);
  server
}

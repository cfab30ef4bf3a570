pub mod admin;
pub mod error;
pub mod exam;
pub mod lesson;
pub mod practice;

use std::collections::HashSet;

use askama::Template;
use axum::{
  extract::State,
  response::Html,
  routing::{get, post},
  Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::LogOnError;
use crate::auth::{self, AuthContext};
use crate::lesson::completion;
use crate::state::AppState;
use error::PageError;

/// Navbar data shared by the signed-in pages
#[derive(Debug, Clone, Default)]
pub struct NavContext {
  pub username: String,
  pub is_admin: bool,
}

impl NavContext {
  pub fn from_auth(auth: &AuthContext) -> Self {
    Self {
      username: auth.user.username.clone(),
      is_admin: auth.is_admin(),
    }
  }
}

pub struct SubtopicLink {
  pub id: i64,
  pub title: String,
  pub completed: bool,
}

pub struct TopicView {
  pub id: i64,
  pub title: String,
  pub subtopics: Vec<SubtopicLink>,
  /// Every sub-unit done, so the unit test is open
  pub test_open: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub nav: NavContext,
  pub topics: Vec<TopicView>,
}

/// GET / - Units with their sub-units and completion marks
pub async fn index(auth: AuthContext) -> Result<Html<String>, PageError> {
  let (topics, completed) = tokio::join!(auth.api.topics(), auth.api.completed_subtopics());
  let topics = topics.map_err(|e| PageError::from(e).retry_at("/"))?;
  let completed: HashSet<i64> = completed
    .log_warn_default("Failed to load completed subtopics")
    .into_iter()
    .collect();

  let topics = topics
    .into_iter()
    .map(|topic| {
      let subtopics: Vec<SubtopicLink> = topic
        .subtopics
        .into_iter()
        .map(|s| SubtopicLink {
          completed: completed.contains(&s.id),
          id: s.id,
          title: s.title,
        })
        .collect();
      let ids: Vec<i64> = subtopics.iter().map(|s| s.id).collect();
      TopicView {
        id: topic.id,
        title: topic.title,
        test_open: completion::test_open(&ids, &completed),
        subtopics,
      }
    })
    .collect();

  let template = IndexTemplate {
    nav: NavContext::from_auth(&auth),
    topics,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// Full application router
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(index))
    // Account
    .route("/login", get(auth::login_page).post(auth::login_submit))
    .route("/register", get(auth::register_page).post(auth::register_submit))
    .route(
      "/forgot-password",
      get(auth::forgot_password_page).post(auth::forgot_password_submit),
    )
    .route(
      "/reset-password",
      get(auth::reset_password_page).post(auth::reset_password_submit),
    )
    .route(
      "/change-password",
      get(auth::change_password_page).post(auth::change_password_submit),
    )
    .route("/logout", post(auth::logout))
    .route("/profile", get(auth::profile_page).post(auth::profile_submit))
    // Lesson player
    .route("/lesson/{id}", get(lesson::lesson_page))
    .route("/lesson/{id}/next", post(lesson::next))
    .route("/lesson/{id}/prev", post(lesson::prev))
    .route("/lesson/{id}/reset", post(lesson::reset))
    .route("/lesson/{id}/choice", post(lesson::choose))
    .route("/lesson/{id}/drill/answer", post(lesson::drill_answer))
    .route("/lesson/{id}/drill/next", post(lesson::drill_next))
    .route("/lesson/{id}/finish", get(lesson::finish))
    // Sub-unit practice
    .route("/practice/{id}", get(practice::practice_page))
    .route("/practice/{id}/answer", post(practice::answer))
    .route("/practice/{id}/assemble", post(practice::assemble))
    .route("/practice/{id}/select", post(practice::select_word))
    .route("/practice/{id}/return", post(practice::return_word))
    .route("/practice/{id}/submit", post(practice::submit_sentence))
    .route("/practice/{id}/next", post(practice::next))
    .route("/practice/{id}/restart", post(practice::restart))
    // Unit test
    .route("/test/{topic}", get(exam::test_page))
    .route("/test/{topic}/answer", post(exam::answer))
    .route("/test/{topic}/select", post(exam::select_word))
    .route("/test/{topic}/return", post(exam::return_word))
    .route("/test/{topic}/sentence", post(exam::submit_sentence))
    .route("/test/{topic}/submit", post(exam::submit))
    // Admin dashboards
    .route("/admin/users", get(admin::users_page))
    .route("/admin/users/new", get(admin::new_user_page).post(admin::create_user))
    .route("/admin/users/{id}/confirm", get(admin::confirm_status))
    .route("/admin/users/{id}/status", post(admin::set_status))
    .nest_service("/static", ServeDir::new("static"))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

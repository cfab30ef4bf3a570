//! Unit test pages. Answers are collected in one pass and scored by the
//! backend on submit.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::error::PageError;
use super::NavContext;
use crate::api::exam::TestSubmission;
use crate::api::ApiError;
use crate::auth::AuthContext;
use crate::domain::{PracticeQuestion, TestResult};
use crate::lesson::completion;
use crate::practice::{ExamSession, WordWithPosition};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "test/question.html")]
pub struct QuestionTemplate {
  pub nav: NavContext,
  pub topic_id: i64,
  pub number: usize,
  pub total: usize,
  pub is_sentence: bool,
  pub media_url: String,
  pub is_video: bool,
  pub options: Vec<String>,
  pub available: Vec<WordWithPosition>,
  pub selected: Vec<WordWithPosition>,
}

#[derive(Template)]
#[template(path = "test/ready.html")]
pub struct ReadyTemplate {
  pub nav: NavContext,
  pub topic_id: i64,
  pub total: usize,
}

#[derive(Template)]
#[template(path = "test/result.html")]
pub struct ResultTemplate {
  pub nav: NavContext,
  pub topic_id: i64,
  pub result: TestResult,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub answer: String,
}

#[derive(Deserialize)]
pub struct PositionForm {
  pub position: usize,
}

fn test_path(topic_id: i64) -> String {
  format!("/test/{}", topic_id)
}

/// The test opens once every sub-unit of the unit is complete
async fn ensure_unlocked(state: &AppState, auth: &AuthContext, topic_id: i64) -> Result<(), PageError> {
  let just_finished = state
    .sessions
    .update_session(&auth.session_id, |s| s.unlocked_test == Some(topic_id))
    .ok_or(PageError::SignedOut)?;
  if just_finished {
    return Ok(());
  }
  let unlocked = completion::test_unlocked(&auth.api, topic_id)
    .await
    .map_err(|e| PageError::from(e).retry_at(test_path(topic_id)))?;
  if unlocked {
    Ok(())
  } else {
    tracing::info!("User {} tried unit {} test before finishing it", auth.user.id, topic_id);
    Err(PageError::Forbidden)
  }
}

async fn load_exam(state: &AppState, auth: &AuthContext, topic_id: i64) -> Result<(), PageError> {
  ensure_unlocked(state, auth, topic_id).await?;
  let ticket = state
    .sessions
    .update_session(&auth.session_id, |s| s.tracker.begin())
    .ok_or(PageError::SignedOut)?;
  let questions = auth
    .api
    .topic_test(topic_id)
    .await
    .map_err(|e| PageError::from(e).retry_at(test_path(topic_id)))?;
  if questions.is_empty() {
    return Err(PageError::NotFound("This unit has no test yet".to_string()));
  }
  tracing::debug!("Unit test {}: {} questions", topic_id, questions.len());

  let exam = ExamSession::new(topic_id, questions);
  let installed = state
    .sessions
    .update_session(&auth.session_id, move |s| {
      s.tracker.accept(ticket, exam).map(|exam| s.exam = Some(exam))
    })
    .ok_or(PageError::SignedOut)?;
  installed.ok_or_else(|| ApiError::Superseded.into())
}

fn exam_view(nav: NavContext, exam: &mut ExamSession) -> Response {
  let topic_id = exam.topic_id;
  if exam.is_complete() {
    let template = ReadyTemplate {
      nav,
      topic_id,
      total: exam.total(),
    };
    return Html(template.render().unwrap_or_default()).into_response();
  }

  let (available, selected) = exam
    .board()
    .map(|b| (b.available().to_vec(), b.selected().to_vec()))
    .unwrap_or_default();
  let mut view = QuestionTemplate {
    nav,
    topic_id,
    number: exam.number(),
    total: exam.total(),
    is_sentence: false,
    media_url: String::new(),
    is_video: false,
    options: Vec::new(),
    available,
    selected,
  };
  match exam.current() {
    Some(PracticeQuestion::MultipleChoice(q)) => {
      view.is_video = q.video_url.is_some();
      view.media_url = q
        .video_url
        .clone()
        .or_else(|| q.image_url.clone())
        .unwrap_or_default();
      view.options = q.options.iter().map(|o| o.text.clone()).collect();
    }
    Some(PracticeQuestion::SentenceBuilding(q)) => {
      view.is_sentence = true;
      view.is_video = q.video_url.is_some();
      view.media_url = q.video_url.clone().unwrap_or_default();
    }
    None => {}
  }
  Html(view.render().unwrap_or_default()).into_response()
}

/// GET /test/{topic} - Current question, or the submit page once all are answered
pub async fn test_page(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
) -> Result<Response, PageError> {
  let loaded = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.exam.as_ref().is_some_and(|e| e.topic_id == topic_id)
    })
    .ok_or(PageError::SignedOut)?;
  if !loaded {
    load_exam(&state, &auth, topic_id).await?;
  }

  let nav = NavContext::from_auth(&auth);
  state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.exam
        .as_mut()
        .filter(|e| e.topic_id == topic_id)
        .map(|exam| exam_view(nav, exam))
    })
    .ok_or(PageError::SignedOut)?
    .ok_or_else(|| PageError::NotFound("Unit test is not loaded".to_string()))
}

fn with_exam<R>(
  state: &AppState,
  auth: &AuthContext,
  topic_id: i64,
  f: impl FnOnce(&mut ExamSession) -> R,
) -> Result<Response, PageError> {
  state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.exam
        .as_mut()
        .filter(|e| e.topic_id == topic_id)
        .map(f)
    })
    .ok_or(PageError::SignedOut)?;
  Ok(Redirect::to(&test_path(topic_id)).into_response())
}

/// POST /test/{topic}/answer
pub async fn answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
  Form(form): Form<AnswerForm>,
) -> Result<Response, PageError> {
  with_exam(&state, &auth, topic_id, |exam| exam.choose(&form.answer))
}

/// POST /test/{topic}/select
pub async fn select_word(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
  Form(form): Form<PositionForm>,
) -> Result<Response, PageError> {
  with_exam(&state, &auth, topic_id, |exam| exam.select_word(form.position))
}

/// POST /test/{topic}/return
pub async fn return_word(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
  Form(form): Form<PositionForm>,
) -> Result<Response, PageError> {
  with_exam(&state, &auth, topic_id, |exam| exam.return_word(form.position))
}

/// POST /test/{topic}/sentence - Record the assembled sentence
pub async fn submit_sentence(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
) -> Result<Response, PageError> {
  with_exam(&state, &auth, topic_id, ExamSession::submit_sentence)
}

/// POST /test/{topic}/submit - Send all answers for scoring
pub async fn submit(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(topic_id): Path<i64>,
) -> Result<Response, PageError> {
  let answers = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.exam
        .as_ref()
        .filter(|e| e.topic_id == topic_id && e.is_complete())
        .map(|e| e.answers().to_vec())
    })
    .ok_or(PageError::SignedOut)?;
  let Some(answers) = answers else {
    return Ok(Redirect::to(&test_path(topic_id)).into_response());
  };

  let submission = TestSubmission {
    answers: &answers,
    user_id: auth.user.id,
  };
  // The answers stay in the session until scoring succeeds
  let result = auth
    .api
    .submit_test(topic_id, &submission)
    .await
    .map_err(|e| PageError::from(e).retry_at(test_path(topic_id)))?;
  tracing::info!(
    "User {} scored {}/{} on unit {}",
    auth.user.id,
    result.score,
    result.total,
    topic_id
  );

  state.sessions.update_session(&auth.session_id, |s| {
    if s.exam.as_ref().is_some_and(|e| e.topic_id == topic_id) {
      s.exam = None;
    }
  });

  let template = ResultTemplate {
    nav: NavContext::from_auth(&auth),
    topic_id,
    result,
  };
  Ok(Html(template.render().unwrap_or_default()).into_response())
}

//! Sub-unit practice: multiple choice first, then sentence building.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::error::PageError;
use super::NavContext;
use crate::api::{spawn_save, ApiError, SaveMeta};
use crate::auth::AuthContext;
use crate::domain::ProgressState;
use crate::practice::{CurrentDrill, Phase, PracticeSession, PracticeSignal, WordWithPosition};
use crate::session::SubtopicPractice;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "practice/session.html")]
pub struct PracticeTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
  pub phase_label: &'static str,
  /// "choice", "preview" or "assemble"
  pub stage: &'static str,
  pub question_number: usize,
  pub question_total: usize,
  pub retry_waiting: usize,
  pub is_retry: bool,
  pub media_url: String,
  pub is_video: bool,
  pub options: Vec<String>,
  pub answered: bool,
  pub was_correct: bool,
  pub chosen: String,
  pub correct_answer: String,
  pub available: Vec<WordWithPosition>,
  pub selected: Vec<WordWithPosition>,
}

#[derive(Template)]
#[template(path = "practice/complete.html")]
pub struct PracticeCompleteTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
  pub choice_correct: usize,
  pub sentence_correct: usize,
}

#[derive(Deserialize)]
pub struct PracticeQuery {
  pub topic: Option<i64>,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub answer: String,
}

#[derive(Deserialize)]
pub struct PositionForm {
  pub position: usize,
}

fn practice_path(subtopic_id: i64) -> String {
  format!("/practice/{}", subtopic_id)
}

fn phase_label(phase: Phase) -> &'static str {
  match phase {
    Phase::MultipleChoice => "Multiple choice",
    Phase::SentenceBuilding => "Sentence building",
  }
}

async fn load_practice(
  state: &AppState,
  auth: &AuthContext,
  subtopic_id: i64,
  topic_id: Option<i64>,
) -> Result<(), PageError> {
  let ticket = state
    .sessions
    .update_session(&auth.session_id, |s| s.tracker.begin())
    .ok_or(PageError::SignedOut)?;

  let (choices, sentences) = tokio::join!(
    auth.api.practice_questions(subtopic_id),
    auth.api.sentence_questions(subtopic_id, topic_id)
  );
  let choices = choices.map_err(|e| PageError::from(e).retry_at(practice_path(subtopic_id)))?;
  tracing::debug!(
    "Practice for subtopic {}: {} choice drills, {} sentence drills",
    subtopic_id,
    choices.len(),
    sentences.len()
  );

  let session = PracticeSession::new(choices, sentences);
  let nothing_to_drill = session.is_finished();
  let practice = SubtopicPractice {
    subtopic_id,
    topic_id,
    session,
  };
  let installed = state
    .sessions
    .update_session(&auth.session_id, move |s| {
      s.tracker
        .accept(ticket, practice)
        .map(|practice| s.practice = Some(practice))
    })
    .ok_or(PageError::SignedOut)?;
  installed.ok_or(ApiError::Superseded)?;

  if nothing_to_drill {
    save_completion(auth, subtopic_id);
  }
  Ok(())
}

fn save_completion(auth: &AuthContext, subtopic_id: i64) {
  tracing::info!("User {} finished practice of subtopic {}", auth.user.id, subtopic_id);
  let progress = ProgressState {
    completed_practice: true,
    ..Default::default()
  };
  spawn_save(
    auth.api.clone(),
    subtopic_id,
    progress,
    SaveMeta {
      user_id: auth.user.id,
    },
  );
}

fn session_view(nav: NavContext, subtopic_id: i64, session: &PracticeSession) -> Response {
  let Some(current) = session.current() else {
    let template = PracticeCompleteTemplate {
      nav,
      subtopic_id,
      choice_correct: session.correct_count(Phase::MultipleChoice),
      sentence_correct: session.correct_count(Phase::SentenceBuilding),
    };
    return Html(template.render().unwrap_or_default()).into_response();
  };

  let (question_number, question_total, retry_waiting) = session.counts();
  let mut view = PracticeTemplate {
    nav,
    subtopic_id,
    phase_label: phase_label(session.phase()),
    stage: "choice",
    question_number,
    question_total,
    retry_waiting,
    is_retry: false,
    media_url: String::new(),
    is_video: false,
    options: Vec::new(),
    answered: false,
    was_correct: false,
    chosen: session.last_choice().unwrap_or_default().to_string(),
    correct_answer: String::new(),
    available: Vec::new(),
    selected: Vec::new(),
  };

  match current {
    CurrentDrill::Choice {
      question,
      answered,
      retry,
    } => {
      view.is_retry = retry;
      view.is_video = question.video_url.is_some();
      view.media_url = question
        .video_url
        .clone()
        .or_else(|| question.image_url.clone())
        .unwrap_or_default();
      view.options = question.options.iter().map(|o| o.text.clone()).collect();
      view.answered = answered.is_some();
      view.was_correct = answered == Some(true);
      view.correct_answer = question.correct_answer.clone();
    }
    CurrentDrill::SentencePreview { question } => {
      view.stage = "preview";
      view.is_video = question.video_url.is_some();
      view.media_url = question.video_url.clone().unwrap_or_default();
    }
    CurrentDrill::SentenceAssemble {
      question,
      board,
      answered,
      retry,
    } => {
      view.stage = "assemble";
      view.is_retry = retry;
      view.is_video = question.video_url.is_some();
      view.media_url = question.video_url.clone().unwrap_or_default();
      view.answered = answered.is_some();
      view.was_correct = answered == Some(true);
      view.correct_answer = question.correct_sentence.clone();
      view.available = board.available().to_vec();
      view.selected = board.selected().to_vec();
    }
  }
  Html(view.render().unwrap_or_default()).into_response()
}

/// GET /practice/{id}?topic= - Current drill, loading the session if needed
pub async fn practice_page(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Query(query): Query<PracticeQuery>,
) -> Result<Response, PageError> {
  let loaded = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.practice.as_ref().is_some_and(|p| p.subtopic_id == subtopic_id)
    })
    .ok_or(PageError::SignedOut)?;
  if !loaded {
    load_practice(&state, &auth, subtopic_id, query.topic).await?;
  }

  let nav = NavContext::from_auth(&auth);
  state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.practice
        .as_ref()
        .filter(|p| p.subtopic_id == subtopic_id)
        .map(|p| session_view(nav, subtopic_id, &p.session))
    })
    .ok_or(PageError::SignedOut)?
    .ok_or_else(|| PageError::NotFound("Practice is not loaded".to_string()))
}

/// Apply `f` to the loaded practice of this sub-unit
fn with_practice<R>(
  state: &AppState,
  auth: &AuthContext,
  subtopic_id: i64,
  f: impl FnOnce(&mut PracticeSession) -> R,
) -> Result<Option<R>, PageError> {
  state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.practice
        .as_mut()
        .filter(|p| p.subtopic_id == subtopic_id)
        .map(|p| f(&mut p.session))
    })
    .ok_or(PageError::SignedOut)
}

/// Record a finished practice and go back to the page
fn after_signal(auth: &AuthContext, subtopic_id: i64, signal: Option<PracticeSignal>) -> Response {
  match signal {
    Some(PracticeSignal::SessionComplete) => save_completion(auth, subtopic_id),
    Some(PracticeSignal::PhaseComplete(phase)) => {
      tracing::debug!("Subtopic {}: {} phase done", subtopic_id, phase.as_str());
    }
    _ => {}
  }
  Redirect::to(&practice_path(subtopic_id)).into_response()
}

/// POST /practice/{id}/answer
pub async fn answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Form(form): Form<AnswerForm>,
) -> Result<Response, PageError> {
  let signal = with_practice(&state, &auth, subtopic_id, |p| p.choose(&form.answer))?;
  Ok(after_signal(&auth, subtopic_id, signal))
}

/// POST /practice/{id}/assemble - Leave the preview and show the words
pub async fn assemble(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  with_practice(&state, &auth, subtopic_id, PracticeSession::begin_assembly)?;
  Ok(Redirect::to(&practice_path(subtopic_id)).into_response())
}

/// POST /practice/{id}/select
pub async fn select_word(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Form(form): Form<PositionForm>,
) -> Result<Response, PageError> {
  with_practice(&state, &auth, subtopic_id, |p| p.select_word(form.position))?;
  Ok(Redirect::to(&practice_path(subtopic_id)).into_response())
}

/// POST /practice/{id}/return
pub async fn return_word(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Form(form): Form<PositionForm>,
) -> Result<Response, PageError> {
  with_practice(&state, &auth, subtopic_id, |p| p.return_word(form.position))?;
  Ok(Redirect::to(&practice_path(subtopic_id)).into_response())
}

/// POST /practice/{id}/submit - Grade the assembled sentence
pub async fn submit_sentence(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  let signal = with_practice(&state, &auth, subtopic_id, PracticeSession::submit_sentence)?;
  Ok(after_signal(&auth, subtopic_id, signal))
}

/// POST /practice/{id}/next
pub async fn next(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  with_practice(&state, &auth, subtopic_id, PracticeSession::advance)?;
  Ok(Redirect::to(&practice_path(subtopic_id)).into_response())
}

/// POST /practice/{id}/restart - Drop the session and fetch the drills again
pub async fn restart(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  let topic_id = state
    .sessions
    .update_session(&auth.session_id, |s| {
      let topic_id = s
        .practice
        .as_ref()
        .filter(|p| p.subtopic_id == subtopic_id)
        .and_then(|p| p.topic_id);
      s.practice = None;
      topic_id
    })
    .ok_or(PageError::SignedOut)?;

  let target = match topic_id {
    Some(topic_id) => format!("{}?topic={}", practice_path(subtopic_id), topic_id),
    None => practice_path(subtopic_id),
  };
  Ok(Redirect::to(&target).into_response())
}

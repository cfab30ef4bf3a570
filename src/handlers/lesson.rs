//! Lesson player pages.
//!
//! The lesson for a sub-unit is loaded once per browser session and then
//! driven by POSTs that feed [`LessonEvent`]s through the reducer. Effects
//! are dispatched after the new state is installed: progress saves run in
//! the background and never delay the page.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::error::PageError;
use super::NavContext;
use crate::api::{spawn_save, ApiClient, ApiError, ErrorKind, ProgressStore, SaveMeta};
use crate::auth::AuthContext;
use crate::domain::{PracticeRange, TimelineStep, UserChoice};
use crate::lesson::{completion, CompletionRoute, LessonEffect, LessonEvent, LessonState};
use crate::practice::{CurrentDrill, PracticeSession, PracticeSignal};
use crate::session::LessonDrill;
use crate::state::AppState;

pub struct StepView {
  pub label: String,
  pub is_current: bool,
  pub is_done: bool,
}

#[derive(Template)]
#[template(path = "lesson/flashcard.html")]
pub struct FlashcardTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
  pub word: String,
  pub description: String,
  pub media_url: String,
  pub is_video: bool,
  pub card_number: usize,
  pub card_total: usize,
  pub completed_count: usize,
  pub already_completed: bool,
  pub can_go_back: bool,
  pub steps: Vec<StepView>,
}

#[derive(Template)]
#[template(path = "lesson/transition.html")]
pub struct TransitionTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
  pub group_label: String,
  pub words: Vec<String>,
}

#[derive(Template)]
#[template(path = "lesson/drill.html")]
pub struct DrillTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
  pub group_label: String,
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
  pub complete: bool,
  pub correct_count: usize,
}

#[derive(Template)]
#[template(path = "lesson/empty.html")]
pub struct EmptyLessonTemplate {
  pub nav: NavContext,
  pub subtopic_id: i64,
}

#[derive(Deserialize)]
pub struct ChoiceForm {
  pub choice: String,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub answer: String,
}

fn lesson_path(subtopic_id: i64) -> String {
  format!("/lesson/{}", subtopic_id)
}

fn group_label(range: PracticeRange) -> String {
  format!("cards {}-{}", range.start + 1, range.end)
}

// ============================================================================
// Loading
// ============================================================================

/// Cards, grouping and saved progress, fetched in parallel
async fn fetch_lesson(api: ApiClient, subtopic_id: i64) -> Result<LessonState, ApiError> {
  let (flashcards, grouping, progress) = tokio::join!(
    api.flashcards(subtopic_id),
    api.timeline_grouping(subtopic_id),
    api.load(subtopic_id)
  );
  let flashcards = flashcards?;
  let progress = match progress {
    Ok(progress) => progress,
    Err(e) if e.kind() == ErrorKind::Auth => return Err(e),
    Err(e) => {
      tracing::warn!("Starting subtopic {} without saved progress: {}", subtopic_id, e);
      Default::default()
    }
  };
  tracing::debug!(
    "Loaded subtopic {}: {} cards, {} already completed",
    subtopic_id,
    flashcards.len(),
    progress.completed_flashcards.len()
  );
  Ok(LessonState::new(subtopic_id, flashcards, grouping.as_deref(), progress))
}

/// Load a lesson into the session. A newer navigation aborts this load and
/// a result that lost the race is never installed.
async fn load_lesson(state: &AppState, auth: &AuthContext, subtopic_id: i64) -> Result<(), PageError> {
  let task = tokio::spawn(fetch_lesson(auth.api.clone(), subtopic_id));
  let ticket = state
    .sessions
    .begin_load(&auth.session_id, task.abort_handle())
    .ok_or(PageError::SignedOut)?;

  let lesson = match task.await {
    Ok(result) => result?,
    Err(e) if e.is_cancelled() => return Err(ApiError::Superseded.into()),
    Err(e) => {
      tracing::warn!("Lesson load for subtopic {} failed: {}", subtopic_id, e);
      return Err(ApiError::Superseded.into());
    }
  };

  let installed = state
    .sessions
    .update_session(&auth.session_id, move |s| {
      s.tracker.accept(ticket, lesson).map(|lesson| {
        s.lesson = Some(lesson);
        s.drill = None;
      })
    })
    .ok_or(PageError::SignedOut)?;
  installed.ok_or_else(|| ApiError::Superseded.into())
}

// ============================================================================
// Rendering
// ============================================================================

enum LessonView {
  Card(FlashcardTemplate),
  Transition(TransitionTemplate),
  Drill(DrillTemplate),
  Empty(EmptyLessonTemplate),
  Finished,
}

fn step_views(lesson: &LessonState) -> Vec<StepView> {
  lesson
    .timeline
    .steps()
    .iter()
    .enumerate()
    .map(|(position, step)| match step {
      TimelineStep::Flashcard { index } => StepView {
        label: lesson
          .flashcards
          .get(*index)
          .map(|c| c.word.clone())
          .unwrap_or_default(),
        is_current: position == lesson.position,
        is_done: lesson
          .flashcards
          .get(*index)
          .is_some_and(|c| lesson.progress.is_flashcard_completed(c.id)),
      },
      TimelineStep::Practice(range) => StepView {
        label: format!("Practice {}", group_label(*range)),
        is_current: position == lesson.position,
        is_done: lesson.progress.is_practice_completed(*range),
      },
    })
    .collect()
}

fn drill_view(nav: NavContext, subtopic_id: i64, drill: &LessonDrill) -> DrillTemplate {
  let session = &drill.session;
  let (question_number, question_total, retry_waiting) = session.counts();
  let mut view = DrillTemplate {
    nav,
    subtopic_id,
    group_label: group_label(drill.range),
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
    complete: session.is_finished(),
    correct_count: session.correct_count(crate::practice::Phase::MultipleChoice),
  };
  if let Some(CurrentDrill::Choice {
    question,
    answered,
    retry,
  }) = session.current()
  {
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
  view
}

fn lesson_view(state: &AppState, auth: &AuthContext, subtopic_id: i64) -> Result<LessonView, PageError> {
  let nav = NavContext::from_auth(auth);
  state
    .sessions
    .update_session(&auth.session_id, |s| {
      let lesson = s.lesson.as_ref().filter(|l| l.subtopic_id == subtopic_id)?;
      if lesson.timeline.is_empty() {
        return Some(LessonView::Empty(EmptyLessonTemplate { nav, subtopic_id }));
      }
      if lesson.finished {
        return Some(LessonView::Finished);
      }
      if let Some(range) = lesson.prompt {
        return Some(LessonView::Transition(TransitionTemplate {
          nav,
          subtopic_id,
          group_label: group_label(range),
          words: lesson.cards_in(range).iter().map(|c| c.word.clone()).collect(),
        }));
      }
      if let Some(range) = lesson.current_practice() {
        let stale = !s
          .drill
          .as_ref()
          .is_some_and(|d| d.subtopic_id == subtopic_id && d.range == range);
        if stale {
          s.drill = Some(LessonDrill {
            subtopic_id,
            range,
            session: PracticeSession::from_flashcards(lesson.cards_in(range)),
          });
        }
        return s
          .drill
          .as_ref()
          .map(|drill| LessonView::Drill(drill_view(nav, subtopic_id, drill)));
      }

      let card = lesson.current_flashcard()?;
      let card_index = lesson.current_step().and_then(TimelineStep::flashcard_index)?;
      Some(LessonView::Card(FlashcardTemplate {
        subtopic_id,
        word: card.word.clone(),
        description: card.description.clone().unwrap_or_default(),
        media_url: card.media().unwrap_or_default().to_string(),
        is_video: card.has_video(),
        card_number: card_index + 1,
        card_total: lesson.flashcards.len(),
        completed_count: lesson.completed_card_count(),
        already_completed: lesson.progress.is_flashcard_completed(card.id),
        can_go_back: !lesson.is_first_position(),
        steps: step_views(lesson),
        nav,
      }))
    })
    .ok_or(PageError::SignedOut)?
    .ok_or_else(|| PageError::NotFound("Lesson is not loaded".to_string()))
}

/// GET /lesson/{id} - Current step of the lesson, loading it first if needed
pub async fn lesson_page(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  let loaded = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.lesson.as_ref().is_some_and(|l| l.subtopic_id == subtopic_id)
    })
    .ok_or(PageError::SignedOut)?;
  if !loaded {
    load_lesson(&state, &auth, subtopic_id)
      .await
      .map_err(|e| match e {
        PageError::Api(e) => PageError::from(e).retry_at(lesson_path(subtopic_id)),
        other => other,
      })?;
  }

  let html = match lesson_view(&state, &auth, subtopic_id)? {
    LessonView::Card(t) => t.render(),
    LessonView::Transition(t) => t.render(),
    LessonView::Drill(t) => t.render(),
    LessonView::Empty(t) => t.render(),
    LessonView::Finished => {
      return Ok(Redirect::to(&format!("/lesson/{}/finish", subtopic_id)).into_response());
    }
  };
  Ok(Html(html.unwrap_or_default()).into_response())
}

// ============================================================================
// Navigation
// ============================================================================

/// Run one event through the reducer and dispatch its effects
fn dispatch(
  state: &AppState,
  auth: &AuthContext,
  subtopic_id: i64,
  event: LessonEvent,
) -> Result<Response, PageError> {
  let effects = state
    .sessions
    .update_session(&auth.session_id, |s| {
      let lesson = s.lesson.as_ref().filter(|l| l.subtopic_id == subtopic_id)?;
      let (next, effects) = lesson.reduce(event);
      s.lesson = Some(next);
      Some(effects)
    })
    .ok_or(PageError::SignedOut)?;

  // Not loaded (expired or another lesson opened): the page loads it again
  let Some(effects) = effects else {
    return Ok(Redirect::to(&lesson_path(subtopic_id)).into_response());
  };

  let mut finished = false;
  for effect in effects {
    match effect {
      LessonEffect::SaveProgress(progress) => {
        spawn_save(
          auth.api.clone(),
          subtopic_id,
          progress,
          SaveMeta {
            user_id: auth.user.id,
          },
        );
      }
      LessonEffect::PromptTransition(range) => {
        tracing::debug!("Subtopic {}: group {} ready for practice", subtopic_id, range.key());
      }
      LessonEffect::Finished => finished = true,
    }
  }

  let target = if finished {
    format!("/lesson/{}/finish", subtopic_id)
  } else {
    lesson_path(subtopic_id)
  };
  Ok(Redirect::to(&target).into_response())
}

/// POST /lesson/{id}/next
pub async fn next(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  dispatch(&state, &auth, subtopic_id, LessonEvent::Next)
}

/// POST /lesson/{id}/prev
pub async fn prev(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  dispatch(&state, &auth, subtopic_id, LessonEvent::Prev)
}

/// POST /lesson/{id}/reset
pub async fn reset(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  dispatch(&state, &auth, subtopic_id, LessonEvent::Reset)
}

/// POST /lesson/{id}/choice - Answer the continue/review prompt
pub async fn choose(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Form(form): Form<ChoiceForm>,
) -> Result<Response, PageError> {
  let choice = UserChoice::from_str(&form.choice)
    .ok_or_else(|| ApiError::Validation(format!("Unknown choice '{}'", form.choice)))?;
  dispatch(&state, &auth, subtopic_id, LessonEvent::Choose(choice))
}

/// POST /lesson/{id}/drill/answer
pub async fn drill_answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
  Form(form): Form<AnswerForm>,
) -> Result<Response, PageError> {
  let signal = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.drill
        .as_mut()
        .filter(|d| d.subtopic_id == subtopic_id)
        .map(|d| d.session.choose(&form.answer))
    })
    .ok_or(PageError::SignedOut)?;
  if signal == Some(PracticeSignal::SessionComplete) {
    tracing::debug!("Subtopic {}: in-lesson drill cleared", subtopic_id);
  }
  Ok(Redirect::to(&lesson_path(subtopic_id)).into_response())
}

/// POST /lesson/{id}/drill/next - Next drill item, or leave a finished drill
pub async fn drill_next(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  let cleared = state
    .sessions
    .update_session(&auth.session_id, |s| {
      let drill = s.drill.as_mut().filter(|d| d.subtopic_id == subtopic_id)?;
      if drill.session.is_finished() {
        let range = drill.range;
        s.drill = None;
        Some(range)
      } else {
        drill.session.advance();
        None
      }
    })
    .ok_or(PageError::SignedOut)?;

  match cleared {
    Some(range) => dispatch(&state, &auth, subtopic_id, LessonEvent::PracticeCompleted(range)),
    None => Ok(Redirect::to(&lesson_path(subtopic_id)).into_response()),
  }
}

/// GET /lesson/{id}/finish - Route to the next sub-unit, the unit test or home
pub async fn finish(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(subtopic_id): Path<i64>,
) -> Result<Response, PageError> {
  let finished = state
    .sessions
    .update_session(&auth.session_id, |s| {
      let done = s
        .lesson
        .as_ref()
        .is_some_and(|l| l.subtopic_id == subtopic_id && (l.finished || l.timeline.is_empty()));
      if done {
        s.lesson = None;
        s.drill = None;
      }
      done
    })
    .ok_or(PageError::SignedOut)?;
  if !finished {
    return Ok(Redirect::to(&lesson_path(subtopic_id)).into_response());
  }

  let route = completion::resolve(&auth.api, subtopic_id).await;
  if let CompletionRoute::UnitTest(topic_id) = route {
    // The last save may not have reached the backend yet
    state.sessions.update_session(&auth.session_id, |s| {
      s.unlocked_test = Some(topic_id);
    });
  }
  Ok(Redirect::to(&route.path()).into_response())
}

//! Progress persistence boundary.
//!
//! Local lesson state is authoritative for the running session. Saves are
//! dispatched after the local mutation and are at-most-once: a failed save
//! is logged and dropped, never retried. Ids are append-only on the backend,
//! so a later save resends anything a dropped one carried.

use std::future::Future;

use serde::Serialize;
use tokio::task::JoinHandle;

use super::{ApiClient, ApiError};
use crate::domain::{ProgressState, UserChoice};

/// Who the save is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveMeta {
  pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveProgressRequest<'a> {
  completed_flashcards: &'a [i64],
  completed_practice: bool,
  completed_practices: &'a [String],
  #[serde(skip_serializing_if = "Option::is_none")]
  user_choice: Option<UserChoice>,
  user_id: i64,
}

pub trait ProgressStore {
  /// Completion record for a sub-unit; empty when none exists yet
  fn load(&self, subtopic_id: i64) -> impl Future<Output = Result<ProgressState, ApiError>> + Send;

  fn save(
    &self,
    subtopic_id: i64,
    progress: &ProgressState,
    meta: &SaveMeta,
  ) -> impl Future<Output = Result<ProgressState, ApiError>> + Send;
}

fn progress_path(subtopic_id: i64) -> String {
  format!("/api/v1/flashcards/subtopic/{}/progress", subtopic_id)
}

impl ProgressStore for ApiClient {
  async fn load(&self, subtopic_id: i64) -> Result<ProgressState, ApiError> {
    match self
      .call::<()>(reqwest::Method::GET, &progress_path(subtopic_id), None)
      .await
    {
      Ok(reply) => Ok(reply.optional()?.unwrap_or_default()),
      Err(e) if e.is_not_found() => Ok(ProgressState::default()),
      Err(e) => Err(e),
    }
  }

  async fn save(
    &self,
    subtopic_id: i64,
    progress: &ProgressState,
    meta: &SaveMeta,
  ) -> Result<ProgressState, ApiError> {
    let body = SaveProgressRequest {
      completed_flashcards: &progress.completed_flashcards,
      completed_practice: progress.completed_practice,
      completed_practices: &progress.completed_practices,
      user_choice: progress.user_choice,
      user_id: meta.user_id,
    };
    let saved = self
      .post(&progress_path(subtopic_id), &body)
      .await?
      .optional::<ProgressState>()?;
    Ok(saved.unwrap_or_else(|| progress.clone()))
  }
}

/// Persist without blocking the caller; failures are logged and dropped.
pub fn spawn_save<S>(
  store: S,
  subtopic_id: i64,
  progress: ProgressState,
  meta: SaveMeta,
) -> JoinHandle<()>
where
  S: ProgressStore + Send + Sync + 'static,
{
  tokio::spawn(async move {
    match store.save(subtopic_id, &progress, &meta).await {
      Ok(saved) if !saved.is_superset_of(&progress) => tracing::warn!(
        "Backend record for subtopic {} is missing ids that were just saved",
        subtopic_id
      ),
      Ok(saved) => tracing::debug!(
        "Saved progress for subtopic {}: {} cards, {} drills",
        subtopic_id,
        saved.completed_flashcards.len(),
        saved.completed_practices.len()
      ),
      Err(e) => tracing::warn!("Dropped progress save for subtopic {}: {}", subtopic_id, e),
    }
  })
}

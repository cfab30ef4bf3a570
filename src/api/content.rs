//! Lesson content: flashcards, drills, grouping and the topic catalogue.

use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::domain::{
  Flashcard, MultipleChoiceQuestion, PracticeRange, SentenceQuestion, Topic,
};

#[derive(Debug, Deserialize)]
struct TimelineGrouping {
  groups: Vec<PracticeRange>,
}

impl ApiClient {
  pub async fn flashcards(&self, subtopic_id: i64) -> Result<Vec<Flashcard>, ApiError> {
    self
      .get(&format!("/api/v1/flashcards/subtopic/{}", subtopic_id))
      .await
  }

  pub async fn practice_questions(
    &self,
    subtopic_id: i64,
  ) -> Result<Vec<MultipleChoiceQuestion>, ApiError> {
    self
      .get(&format!("/api/v1/flashcards/subtopic/{}/practice", subtopic_id))
      .await
  }

  /// Sentence drills for a sub-unit.
  ///
  /// Falls back to the topic's drills when the sub-unit has none, and to an
  /// empty list when neither lookup works. Never fails.
  pub async fn sentence_questions(
    &self,
    subtopic_id: i64,
    topic_id: Option<i64>,
  ) -> Vec<SentenceQuestion> {
    let path = format!("/api/v1/flashcards/subtopic/{}/sentence-building", subtopic_id);
    match self.get::<Vec<SentenceQuestion>>(&path).await {
      Ok(questions) if !questions.is_empty() => return questions,
      Ok(_) => {}
      Err(e) => tracing::debug!("Sentence drills for subtopic {} unavailable: {}", subtopic_id, e),
    }

    let Some(topic_id) = topic_id else {
      return Vec::new();
    };
    let path = format!("/api/v1/flashcards/topic/{}/sentence-building", topic_id);
    self
      .get::<Vec<SentenceQuestion>>(&path)
      .await
      .unwrap_or_else(|e| {
        tracing::debug!("Sentence drills for topic {} unavailable: {}", topic_id, e);
        Vec::new()
      })
  }

  /// Backend-computed card grouping, `None` when absent or unreachable.
  pub async fn timeline_grouping(&self, subtopic_id: i64) -> Option<Vec<PracticeRange>> {
    let path = format!("/api/v1/flashcards/subtopic/{}/timeline", subtopic_id);
    match self.call::<()>(reqwest::Method::GET, &path, None).await {
      Ok(reply) => reply
        .optional::<TimelineGrouping>()
        .unwrap_or_else(|e| {
          tracing::debug!("Unusable timeline grouping for subtopic {}: {}", subtopic_id, e);
          None
        })
        .map(|g| g.groups),
      Err(e) => {
        tracing::debug!("No timeline grouping for subtopic {}: {}", subtopic_id, e);
        None
      }
    }
  }

  pub async fn topics(&self) -> Result<Vec<Topic>, ApiError> {
    self.get("/api/v1/flashcards/topics").await
  }
}

use super::{ApiClient, ApiError};
use crate::domain::{NextSubtopic, SubtopicSummary};

impl ApiClient {
  pub async fn next_subtopic(&self, subtopic_id: i64) -> Result<NextSubtopic, ApiError> {
    self
      .get(&format!("/api/v1/flashcards/subtopic/{}/next-subtopic", subtopic_id))
      .await
  }

  pub async fn topic_subtopics(&self, topic_id: i64) -> Result<Vec<SubtopicSummary>, ApiError> {
    self
      .get(&format!("/api/v1/flashcards/topic/{}/subtopics", topic_id))
      .await
  }

  /// Every sub-unit the signed-in learner has finished, across all units
  pub async fn completed_subtopics(&self) -> Result<Vec<i64>, ApiError> {
    self.get("/api/v1/flashcards/completed-subtopics").await
  }
}

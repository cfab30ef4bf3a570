use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::domain::{PracticeQuestion, TestResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAnswer {
  pub question_id: i64,
  pub answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission<'a> {
  pub answers: &'a [TestAnswer],
  pub user_id: i64,
}

impl ApiClient {
  pub async fn topic_test(&self, topic_id: i64) -> Result<Vec<PracticeQuestion>, ApiError> {
    self
      .get(&format!("/api/v1/flashcards/topic/{}/test", topic_id))
      .await
  }

  /// Scoring happens on the backend
  pub async fn submit_test(
    &self,
    topic_id: i64,
    submission: &TestSubmission<'_>,
  ) -> Result<TestResult, ApiError> {
    self
      .post(&format!("/api/v1/flashcards/topic/{}/test/submit", topic_id), submission)
      .await?
      .data()
  }
}

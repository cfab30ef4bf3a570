//! Where to go after the last step of a sub-unit.
//!
//! The unit test only opens once every sibling sub-unit is complete.

use std::collections::HashSet;

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRoute {
  NextSubtopic(i64),
  UnitTest(i64),
  Home,
}

impl CompletionRoute {
  pub fn path(&self) -> String {
    match self {
      Self::NextSubtopic(id) => format!("/lesson/{}", id),
      Self::UnitTest(topic_id) => format!("/test/{}", topic_id),
      Self::Home => "/".to_string(),
    }
  }
}

/// Pure routing decision. `current` counts as complete.
pub fn decide(
  next_subtopic: Option<i64>,
  topic_id: i64,
  siblings: &[i64],
  completed: &HashSet<i64>,
  current: i64,
) -> CompletionRoute {
  if let Some(next) = next_subtopic {
    return CompletionRoute::NextSubtopic(next);
  }
  let all_done = siblings
    .iter()
    .all(|id| *id == current || completed.contains(id));
  if all_done {
    CompletionRoute::UnitTest(topic_id)
  } else {
    CompletionRoute::Home
  }
}

/// Every sub-unit of the unit is complete
pub fn test_open(siblings: &[i64], completed: &HashSet<i64>) -> bool {
  !siblings.is_empty() && siblings.iter().all(|id| completed.contains(id))
}

/// Ask the backend whether the learner may take the unit test
pub async fn test_unlocked(api: &ApiClient, topic_id: i64) -> Result<bool, ApiError> {
  let (siblings, completed) = tokio::try_join!(
    api.topic_subtopics(topic_id),
    api.completed_subtopics()
  )?;
  let siblings: Vec<i64> = siblings.iter().map(|s| s.id).collect();
  let completed: HashSet<i64> = completed.into_iter().collect();
  Ok(test_open(&siblings, &completed))
}

/// Look up the sibling state and decide. Any failed lookup routes home.
pub async fn resolve(api: &ApiClient, subtopic_id: i64) -> CompletionRoute {
  match lookup(api, subtopic_id).await {
    Ok(route) => {
      tracing::info!("Subtopic {} finished, routing to {}", subtopic_id, route.path());
      route
    }
    Err(e) => {
      tracing::warn!("Completion lookup for subtopic {} failed: {}", subtopic_id, e);
      CompletionRoute::Home
    }
  }
}

async fn lookup(api: &ApiClient, subtopic_id: i64) -> Result<CompletionRoute, ApiError> {
  let next = api.next_subtopic(subtopic_id).await?;
  if let Some(id) = next.next_subtopic_id {
    return Ok(CompletionRoute::NextSubtopic(id));
  }
  let (siblings, completed) = tokio::try_join!(
    api.topic_subtopics(next.topic_id),
    api.completed_subtopics()
  )?;
  let siblings: Vec<i64> = siblings.iter().map(|s| s.id).collect();
  let completed: HashSet<i64> = completed.into_iter().collect();
  Ok(decide(None, next.topic_id, &siblings, &completed, subtopic_id))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{MockBackend, LEARNER_TOKEN};

  #[test]
  fn test_next_subtopic_wins() {
    let route = decide(Some(9), 1, &[8, 9], &HashSet::new(), 8);
    assert_eq!(route, CompletionRoute::NextSubtopic(9));
    assert_eq!(route.path(), "/lesson/9");
  }

  #[test]
  fn test_all_siblings_done_opens_test() {
    let completed: HashSet<i64> = [1, 2].into_iter().collect();
    assert_eq!(decide(None, 5, &[1, 2, 3], &completed, 3), CompletionRoute::UnitTest(5));
  }

  #[test]
  fn test_unfinished_sibling_routes_home() {
    let completed: HashSet<i64> = [1].into_iter().collect();
    assert_eq!(decide(None, 5, &[1, 2, 3], &completed, 3), CompletionRoute::Home);
    assert_eq!(CompletionRoute::Home.path(), "/");
  }

  #[tokio::test]
  async fn test_resolve_against_backend() {
    let backend = MockBackend::start().await;
    let client = backend.client().with_token(LEARNER_TOKEN);
    assert_eq!(resolve(&client, 42).await, CompletionRoute::NextSubtopic(43));
    // 43 is last of topic 7, but 42 is not finished yet
    assert_eq!(resolve(&client, 43).await, CompletionRoute::Home);
    backend.complete_subtopic(42);
    assert_eq!(resolve(&client, 43).await, CompletionRoute::UnitTest(7));
  }

  #[test]
  fn test_test_open_needs_every_sibling() {
    let completed: HashSet<i64> = [1, 2].into_iter().collect();
    assert!(!test_open(&[1, 2, 3], &completed));
    assert!(test_open(&[1, 2], &completed));
    assert!(!test_open(&[], &completed));
  }

  #[tokio::test]
  async fn test_unlocked_against_backend() {
    let backend = MockBackend::start().await;
    let client = backend.client().with_token(LEARNER_TOKEN);
    assert!(!test_unlocked(&client, 7).await.unwrap());
    backend.complete_subtopic(42);
    backend.complete_subtopic(43);
    assert!(test_unlocked(&client, 7).await.unwrap());
    assert!(test_unlocked(&client, 99).await.is_err());
  }

  #[tokio::test]
  async fn test_failed_lookup_routes_home() {
    let backend = MockBackend::start().await;
    assert_eq!(resolve(&backend.client(), 999).await, CompletionRoute::Home);
  }
}

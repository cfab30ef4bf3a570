use serde::{Deserialize, Serialize};

use super::timeline::PracticeRange;

/// What the learner picked at the end of a card group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserChoice {
  Continue,
  Review,
}

impl UserChoice {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Continue => "continue",
      Self::Review => "review",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "continue" => Some(Self::Continue),
      "review" => Some(Self::Review),
      _ => None,
    }
  }
}

/// Completion record for one learner and one sub-unit.
///
/// Both id lists are append-only and keep first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
  #[serde(default)]
  pub completed_flashcards: Vec<i64>,
  /// Set once any drill of the sub-unit has been finished
  #[serde(default)]
  pub completed_practice: bool,
  #[serde(default)]
  pub completed_practices: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_choice: Option<UserChoice>,
}

impl ProgressState {
  pub fn is_empty(&self) -> bool {
    self.completed_flashcards.is_empty() && self.completed_practices.is_empty()
  }

  /// Returns true if the id was newly recorded
  pub fn mark_flashcard(&mut self, id: i64) -> bool {
    if self.completed_flashcards.contains(&id) {
      return false;
    }
    self.completed_flashcards.push(id);
    true
  }

  pub fn is_flashcard_completed(&self, id: i64) -> bool {
    self.completed_flashcards.contains(&id)
  }

  pub fn mark_practice(&mut self, range: PracticeRange) -> bool {
    self.completed_practice = true;
    let key = range.key();
    if self.completed_practices.contains(&key) {
      return false;
    }
    self.completed_practices.push(key);
    true
  }

  pub fn is_practice_completed(&self, range: PracticeRange) -> bool {
    self.is_key_completed(&range.key())
  }

  pub fn is_key_completed(&self, key: &str) -> bool {
    self.completed_practices.iter().any(|k| k == key)
  }

  /// Union with another record; `other`'s choice wins when present.
  pub fn merge(&mut self, other: &ProgressState) {
    for id in &other.completed_flashcards {
      self.mark_flashcard(*id);
    }
    for key in &other.completed_practices {
      if !self.is_key_completed(key) {
        self.completed_practices.push(key.clone());
      }
    }
    self.completed_practice |= other.completed_practice;
    if other.user_choice.is_some() {
      self.user_choice = other.user_choice;
    }
  }

  /// True if every id and key of `other` is also recorded here
  pub fn is_superset_of(&self, other: &ProgressState) -> bool {
    other
      .completed_flashcards
      .iter()
      .all(|id| self.is_flashcard_completed(*id))
      && other
        .completed_practices
        .iter()
        .all(|key| self.is_key_completed(key))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mark_flashcard_is_idempotent() {
    let mut progress = ProgressState::default();
    assert!(progress.mark_flashcard(3));
    assert!(progress.mark_flashcard(1));
    assert!(!progress.mark_flashcard(3));
    assert_eq!(progress.completed_flashcards, vec![3, 1]);
  }

  #[test]
  fn test_mark_practice_sets_flag() {
    let mut progress = ProgressState::default();
    assert!(!progress.completed_practice);
    progress.mark_practice(PracticeRange::new(0, 3));
    assert!(progress.completed_practice);
    assert!(progress.is_practice_completed(PracticeRange::new(0, 3)));
    assert!(!progress.is_practice_completed(PracticeRange::new(3, 6)));
  }

  #[test]
  fn test_merge_is_union() {
    let mut local = ProgressState {
      completed_flashcards: vec![1, 2],
      completed_practices: vec!["0-3".to_string()],
      ..Default::default()
    };
    let remote = ProgressState {
      completed_flashcards: vec![2, 5],
      completed_practice: true,
      completed_practices: vec!["3-6".to_string(), "0-3".to_string()],
      user_choice: Some(UserChoice::Review),
    };
    local.merge(&remote);
    assert_eq!(local.completed_flashcards, vec![1, 2, 5]);
    assert_eq!(local.completed_practices, vec!["0-3", "3-6"]);
    assert!(local.completed_practice);
    assert_eq!(local.user_choice, Some(UserChoice::Review));
    assert!(local.is_superset_of(&remote));
  }

  #[test]
  fn test_parse_wire_format() {
    let json = r#"{
      "completedFlashcards": [1, 2, 3],
      "completedPractice": true,
      "completedPractices": ["0-3"],
      "userChoice": "continue"
    }"#;
    let progress: ProgressState = serde_json::from_str(json).unwrap();
    assert_eq!(progress.completed_flashcards, vec![1, 2, 3]);
    assert_eq!(progress.user_choice, Some(UserChoice::Continue));
  }

  #[test]
  fn test_parse_partial_record() {
    let progress: ProgressState = serde_json::from_str("{}").unwrap();
    assert!(progress.is_empty());
    assert!(!progress.completed_practice);
  }
}

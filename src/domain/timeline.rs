//! Timeline steps: the play order of a sub-unit's study session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Half-open span `[start, end)` of flashcard indices covered by one drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PracticeRange {
  pub start: usize,
  pub end: usize,
}

impl PracticeRange {
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  pub fn len(&self) -> usize {
    self.end.saturating_sub(self.start)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Storage key, e.g. `"0-3"`
  pub fn key(&self) -> String {
    format!("{}-{}", self.start, self.end)
  }

  pub fn contains(&self, index: usize) -> bool {
    self.as_range().contains(&index)
  }

  pub fn as_range(&self) -> Range<usize> {
    self.start..self.end
  }
}

impl fmt::Display for PracticeRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.start, self.end)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimelineStep {
  Flashcard { index: usize },
  Practice(PracticeRange),
}

impl TimelineStep {
  pub fn practice(start: usize, end: usize) -> Self {
    Self::Practice(PracticeRange::new(start, end))
  }

  pub fn is_practice(&self) -> bool {
    matches!(self, Self::Practice(_))
  }

  pub fn flashcard_index(&self) -> Option<usize> {
    match self {
      Self::Flashcard { index } => Some(*index),
      Self::Practice(_) => None,
    }
  }

  pub fn practice_range(&self) -> Option<PracticeRange> {
    match self {
      Self::Practice(range) => Some(*range),
      Self::Flashcard { .. } => None,
    }
  }
}

/// Immutable, cheaply cloned step sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline(Arc<[TimelineStep]>);

impl Timeline {
  pub fn new(steps: Vec<TimelineStep>) -> Self {
    Self(steps.into())
  }

  pub fn steps(&self) -> &[TimelineStep] {
    &self.0
  }

  pub fn get(&self, position: usize) -> Option<&TimelineStep> {
    self.0.get(position)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Position of the flashcard step for `index`
  pub fn position_of_flashcard(&self, index: usize) -> Option<usize> {
    self
      .0
      .iter()
      .position(|s| s.flashcard_index() == Some(index))
  }
}

//! Practice and test drill items.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
  pub text: String,
  #[serde(default)]
  pub image_url: Option<String>,
}

impl AnswerOption {
  pub fn text(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      image_url: None,
    }
  }
}

/// "Which word does this sign mean?"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceQuestion {
  pub id: i64,
  #[serde(default)]
  pub video_url: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  pub options: Vec<AnswerOption>,
  pub correct_answer: String,
}

impl MultipleChoiceQuestion {
  pub fn is_correct(&self, answer: &str) -> bool {
    answer == self.correct_answer
  }

  pub fn has_option(&self, text: &str) -> bool {
    self.options.iter().any(|o| o.text == text)
  }
}

/// Assemble the signed sentence from scrambled words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceQuestion {
  pub id: i64,
  #[serde(default)]
  pub video_url: Option<String>,
  /// Words in scrambled display order
  #[serde(alias = "scrambledWords")]
  pub words: Vec<String>,
  #[serde(alias = "correctAnswer")]
  pub correct_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PracticeQuestion {
  MultipleChoice(MultipleChoiceQuestion),
  SentenceBuilding(SentenceQuestion),
}

impl PracticeQuestion {
  pub fn id(&self) -> i64 {
    match self {
      Self::MultipleChoice(q) => q.id,
      Self::SentenceBuilding(q) => q.id,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::MultipleChoice(_) => "multiple-choice",
      Self::SentenceBuilding(_) => "sentence-building",
    }
  }
}

/// Aggregate score of a unit test as computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
  pub score: u32,
  pub total: u32,
  #[serde(default)]
  pub passed: bool,
}

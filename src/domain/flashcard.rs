use serde::{Deserialize, Serialize};

/// One sign/vocabulary item of a sub-unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
  pub id: i64,
  /// Gloss shown with the sign
  #[serde(alias = "text")]
  pub word: String,
  #[serde(default)]
  pub video_url: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

impl Flashcard {
  pub fn new(id: i64, word: impl Into<String>) -> Self {
    Self {
      id,
      word: word.into(),
      video_url: None,
      image_url: None,
      description: None,
    }
  }

  /// Media reference to display, video preferred over image
  pub fn media(&self) -> Option<&str> {
    self.video_url.as_deref().or(self.image_url.as_deref())
  }

  pub fn has_video(&self) -> bool {
    self.video_url.is_some()
  }
}

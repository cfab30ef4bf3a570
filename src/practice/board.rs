//! Word pool for sentence building.

use serde::{Deserialize, Serialize};

/// A scrambled word and its slot in the scrambled layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordWithPosition {
  pub word: String,
  pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBoard {
  /// Kept sorted by `position`
  available: Vec<WordWithPosition>,
  /// In selection order
  selected: Vec<WordWithPosition>,
}

impl WordBoard {
  pub fn new(words: &[String]) -> Self {
    Self {
      available: words
        .iter()
        .enumerate()
        .map(|(position, word)| WordWithPosition {
          word: word.clone(),
          position,
        })
        .collect(),
      selected: Vec::new(),
    }
  }

  pub fn available(&self) -> &[WordWithPosition] {
    &self.available
  }

  pub fn selected(&self) -> &[WordWithPosition] {
    &self.selected
  }

  /// Move a word from the pool to the end of the sentence
  pub fn select(&mut self, position: usize) -> bool {
    let Some(at) = self.available.iter().position(|w| w.position == position) else {
      return false;
    };
    let word = self.available.remove(at);
    self.selected.push(word);
    true
  }

  /// Put a word back into its original slot of the pool
  pub fn unselect(&mut self, position: usize) -> bool {
    let Some(at) = self.selected.iter().position(|w| w.position == position) else {
      return false;
    };
    let word = self.selected.remove(at);
    let slot = self.available.partition_point(|w| w.position < word.position);
    self.available.insert(slot, word);
    true
  }

  pub fn clear(&mut self) {
    let mut words = std::mem::take(&mut self.selected);
    words.append(&mut self.available);
    words.sort_by_key(|w| w.position);
    self.available = words;
  }

  /// Selected words joined by single spaces
  pub fn sentence(&self) -> String {
    self
      .selected
      .iter()
      .map(|w| w.word.as_str())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Exact comparison: same words, same order, same case and spacing.
pub fn grade_sentence(assembled: &str, correct: &str) -> bool {
  assembled == correct
}

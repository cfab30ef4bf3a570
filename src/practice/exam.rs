//! Unit test: one pass, no retries, scored by the backend.

use std::collections::HashMap;

use super::board::WordBoard;
use crate::api::exam::TestAnswer;
use crate::domain::PracticeQuestion;

#[derive(Debug, Clone)]
pub struct ExamSession {
  pub topic_id: i64,
  questions: Vec<PracticeQuestion>,
  cursor: usize,
  answers: Vec<TestAnswer>,
  boards: HashMap<i64, WordBoard>,
}

impl ExamSession {
  pub fn new(topic_id: i64, questions: Vec<PracticeQuestion>) -> Self {
    Self {
      topic_id,
      questions,
      cursor: 0,
      answers: Vec::new(),
      boards: HashMap::new(),
    }
  }

  pub fn current(&self) -> Option<&PracticeQuestion> {
    self.questions.get(self.cursor)
  }

  /// 1-based number of the current question
  pub fn number(&self) -> usize {
    (self.cursor + 1).min(self.questions.len())
  }

  pub fn total(&self) -> usize {
    self.questions.len()
  }

  pub fn is_complete(&self) -> bool {
    self.cursor >= self.questions.len()
  }

  pub fn answers(&self) -> &[TestAnswer] {
    &self.answers
  }

  /// Word pool for the current sentence question, created on first visit
  pub fn board(&mut self) -> Option<&WordBoard> {
    self.board_mut().map(|b| &*b)
  }

  fn board_mut(&mut self) -> Option<&mut WordBoard> {
    match self.questions.get(self.cursor)? {
      PracticeQuestion::SentenceBuilding(q) => Some(
        self
          .boards
          .entry(q.id)
          .or_insert_with(|| WordBoard::new(&q.words)),
      ),
      PracticeQuestion::MultipleChoice(_) => None,
    }
  }

  pub fn select_word(&mut self, position: usize) -> bool {
    self.board_mut().is_some_and(|b| b.select(position))
  }

  pub fn return_word(&mut self, position: usize) -> bool {
    self.board_mut().is_some_and(|b| b.unselect(position))
  }

  /// Record a multiple-choice answer and move on. First answer wins.
  pub fn choose(&mut self, answer: &str) -> bool {
    match self.current() {
      Some(PracticeQuestion::MultipleChoice(q)) if q.has_option(answer) => {
        let id = q.id;
        self.record(id, answer.to_string());
        true
      }
      _ => false,
    }
  }

  /// Record the assembled sentence and move on
  pub fn submit_sentence(&mut self) -> bool {
    let Some(sentence) = self.board_mut().map(|b| b.sentence()) else {
      return false;
    };
    let Some(id) = self.current().map(PracticeQuestion::id) else {
      return false;
    };
    self.record(id, sentence);
    true
  }

  fn record(&mut self, question_id: i64, answer: String) {
    self.answers.push(TestAnswer {
      question_id,
      answer,
    });
    self.boards.remove(&question_id);
    self.cursor += 1;
  }
}

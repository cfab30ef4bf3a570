//! One pass over a phase's drills plus re-serving of missed ones.

use std::collections::VecDeque;

/// FIFO of drill indices answered incorrectly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryQueue {
  pending: VecDeque<usize>,
}

impl RetryQueue {
  pub fn push(&mut self, index: usize) {
    self.pending.push_back(index);
  }

  pub fn pop(&mut self) -> Option<usize> {
    self.pending.pop_front()
  }

  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }
}

/// Result of answering the drill currently served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSignal {
  /// An answer was already recorded for this serving
  Ignored,
  Incorrect,
  Correct,
  /// Correct, and nothing is left in the pass or the retry queue
  Complete,
}

/// Serving state of one phase.
#[derive(Debug, Clone)]
pub struct PhaseRun {
  len: usize,
  next_primary: usize,
  retry: RetryQueue,
  current: Option<usize>,
  from_retry: bool,
  answered: Option<bool>,
  correct: usize,
  complete: bool,
}

impl PhaseRun {
  pub fn new(len: usize) -> Self {
    Self {
      len,
      next_primary: len.min(1),
      retry: RetryQueue::default(),
      current: (len > 0).then_some(0),
      from_retry: false,
      answered: None,
      correct: 0,
      complete: len == 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn current(&self) -> Option<usize> {
    self.current
  }

  /// `Some(correct)` once the current serving has been answered
  pub fn answered(&self) -> Option<bool> {
    self.answered
  }

  pub fn is_retry(&self) -> bool {
    self.from_retry
  }

  pub fn retry_len(&self) -> usize {
    self.retry.len()
  }

  pub fn correct_count(&self) -> usize {
    self.correct
  }

  pub fn is_complete(&self) -> bool {
    self.complete
  }

  /// 1-based position in the primary pass (for display)
  pub fn pass_position(&self) -> usize {
    if self.from_retry {
      self.len
    } else {
      self.next_primary
    }
  }

  /// Record the answer for the current serving; first answer wins.
  pub fn answer(&mut self, correct: bool) -> AnswerSignal {
    let Some(index) = self.current else {
      return AnswerSignal::Ignored;
    };
    if self.answered.is_some() {
      return AnswerSignal::Ignored;
    }
    self.answered = Some(correct);

    if !correct {
      self.retry.push(index);
      return AnswerSignal::Incorrect;
    }

    self.correct += 1;
    if self.next_primary >= self.len && self.retry.is_empty() {
      self.complete = true;
      AnswerSignal::Complete
    } else {
      AnswerSignal::Correct
    }
  }

  /// Serve the next drill. Returns `None` when the phase is over or the
  /// current drill is still unanswered.
  pub fn advance(&mut self) -> Option<usize> {
    if self.current.is_some() && self.answered.is_none() {
      return None;
    }
    self.answered = None;

    if self.next_primary < self.len {
      let index = self.next_primary;
      self.next_primary += 1;
      self.current = Some(index);
      self.from_retry = false;
    } else if let Some(index) = self.retry.pop() {
      self.current = Some(index);
      self.from_retry = true;
    } else {
      self.current = None;
    }
    self.current
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_retry_queue_is_fifo() {
    let mut queue = RetryQueue::default();
    queue.push(2);
    queue.push(0);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop(), Some(2));
    assert_eq!(queue.pop(), Some(0));
    assert!(queue.is_empty());
  }

  #[test]
  fn test_all_correct_single_pass() {
    let mut run = PhaseRun::new(2);
    assert_eq!(run.current(), Some(0));
    assert_eq!(run.answer(true), AnswerSignal::Correct);
    assert_eq!(run.advance(), Some(1));
    assert_eq!(run.answer(true), AnswerSignal::Complete);
    assert_eq!(run.advance(), None);
    assert!(run.is_complete());
  }

  #[test]
  fn test_missed_item_is_reserved_until_correct() {
    let k = 3;
    let mut run = PhaseRun::new(k);
    let mut completions = 0;

    assert_eq!(run.answer(false), AnswerSignal::Incorrect);
    assert_eq!(run.advance(), Some(1));
    assert_eq!(run.answer(true), AnswerSignal::Correct);
    assert_eq!(run.advance(), Some(2));
    assert_eq!(run.answer(true), AnswerSignal::Correct);

    assert_eq!(run.advance(), Some(0));
    assert!(run.is_retry());
    assert_eq!(run.answer(false), AnswerSignal::Incorrect);
    assert_eq!(run.advance(), Some(0));
    if run.answer(true) == AnswerSignal::Complete {
      completions += 1;
    }
    // Further clicks and advances never re-signal
    if run.answer(true) == AnswerSignal::Complete {
      completions += 1;
    }
    assert_eq!(run.advance(), None);
    assert_eq!(run.answer(true), AnswerSignal::Ignored);

    assert_eq!(run.correct_count(), k);
    assert_eq!(completions, 1);
  }

  #[test]
  fn test_first_answer_wins() {
    let mut run = PhaseRun::new(2);
    assert_eq!(run.answer(true), AnswerSignal::Correct);
    assert_eq!(run.answer(false), AnswerSignal::Ignored);
    assert_eq!(run.answered(), Some(true));
    assert_eq!(run.retry_len(), 0);
  }

  #[test]
  fn test_cannot_skip_unanswered() {
    let mut run = PhaseRun::new(2);
    assert_eq!(run.advance(), None);
    assert_eq!(run.current(), Some(0));
  }

  #[test]
  fn test_empty_phase_is_complete() {
    let mut run = PhaseRun::new(0);
    assert!(run.is_complete());
    assert_eq!(run.current(), None);
    assert_eq!(run.answer(true), AnswerSignal::Ignored);
  }
}

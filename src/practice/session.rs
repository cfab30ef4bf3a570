//! Practice session: multiple choice first, then sentence building.
//!
//! Each phase owns its own retry queue. Sentence drills are served in two
//! stages, a preview of the signed sentence and then the word assembly.

use std::collections::HashMap;

use rand::seq::SliceRandom;

use super::board::{grade_sentence, WordBoard};
use super::retry::{AnswerSignal, PhaseRun};
use crate::domain::{AnswerOption, Flashcard, MultipleChoiceQuestion, SentenceQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  MultipleChoice,
  SentenceBuilding,
}

impl Phase {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MultipleChoice => "multiple-choice",
      Self::SentenceBuilding => "sentence-building",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceStage {
  Preview,
  Assemble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeSignal {
  Ignored,
  Correct,
  Incorrect,
  PhaseComplete(Phase),
  SessionComplete,
}

/// What the learner sees right now.
#[derive(Debug)]
pub enum CurrentDrill<'a> {
  Choice {
    question: &'a MultipleChoiceQuestion,
    answered: Option<bool>,
    retry: bool,
  },
  SentencePreview {
    question: &'a SentenceQuestion,
  },
  SentenceAssemble {
    question: &'a SentenceQuestion,
    board: &'a WordBoard,
    answered: Option<bool>,
    retry: bool,
  },
}

#[derive(Debug, Clone)]
pub struct PracticeSession {
  choices: Vec<MultipleChoiceQuestion>,
  choice_run: PhaseRun,
  sentences: Vec<SentenceQuestion>,
  sentence_run: PhaseRun,
  phase: Phase,
  stage: SentenceStage,
  /// Word pools by question id, filled on first visit
  boards: HashMap<i64, WordBoard>,
  last_choice: Option<String>,
  finished: bool,
}

impl PracticeSession {
  pub fn new(choices: Vec<MultipleChoiceQuestion>, sentences: Vec<SentenceQuestion>) -> Self {
    let phase = if choices.is_empty() {
      Phase::SentenceBuilding
    } else {
      Phase::MultipleChoice
    };
    let finished = choices.is_empty() && sentences.is_empty();
    Self {
      choice_run: PhaseRun::new(choices.len()),
      sentence_run: PhaseRun::new(sentences.len()),
      choices,
      sentences,
      phase,
      stage: SentenceStage::Preview,
      boards: HashMap::new(),
      last_choice: None,
      finished,
    }
  }

  /// In-lesson drill over a card group: pick the word for each sign.
  pub fn from_flashcards(cards: &[Flashcard]) -> Self {
    let mut rng = rand::rng();
    let mut words: Vec<String> = cards.iter().map(|c| c.word.clone()).collect();
    words.sort();
    words.dedup();

    let questions = cards
      .iter()
      .map(|card| {
        let mut options: Vec<AnswerOption> =
          words.iter().map(|w| AnswerOption::text(w.clone())).collect();
        options.shuffle(&mut rng);
        MultipleChoiceQuestion {
          id: card.id,
          video_url: card.video_url.clone(),
          image_url: card.image_url.clone(),
          options,
          correct_answer: card.word.clone(),
        }
      })
      .collect();
    Self::new(questions, Vec::new())
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }

  pub fn last_choice(&self) -> Option<&str> {
    self.last_choice.as_deref()
  }

  fn run(&self) -> &PhaseRun {
    match self.phase {
      Phase::MultipleChoice => &self.choice_run,
      Phase::SentenceBuilding => &self.sentence_run,
    }
  }

  /// (served so far in the pass, pass length, waiting in retry)
  pub fn counts(&self) -> (usize, usize, usize) {
    let run = self.run();
    (run.pass_position(), run.len(), run.retry_len())
  }

  pub fn correct_count(&self, phase: Phase) -> usize {
    match phase {
      Phase::MultipleChoice => self.choice_run.correct_count(),
      Phase::SentenceBuilding => self.sentence_run.correct_count(),
    }
  }

  pub fn current(&self) -> Option<CurrentDrill<'_>> {
    if self.finished {
      return None;
    }
    let run = self.run();
    let index = run.current()?;
    match self.phase {
      Phase::MultipleChoice => Some(CurrentDrill::Choice {
        question: self.choices.get(index)?,
        answered: run.answered(),
        retry: run.is_retry(),
      }),
      Phase::SentenceBuilding => {
        let question = self.sentences.get(index)?;
        match (self.stage, self.boards.get(&question.id)) {
          (SentenceStage::Assemble, Some(board)) => Some(CurrentDrill::SentenceAssemble {
            question,
            board,
            answered: run.answered(),
            retry: run.is_retry(),
          }),
          _ => Some(CurrentDrill::SentencePreview { question }),
        }
      }
    }
  }

  /// Answer the current multiple-choice drill
  pub fn choose(&mut self, answer: &str) -> PracticeSignal {
    if self.finished || self.phase != Phase::MultipleChoice {
      return PracticeSignal::Ignored;
    }
    let Some(question) = self.choice_run.current().and_then(|i| self.choices.get(i)) else {
      return PracticeSignal::Ignored;
    };
    let correct = question.is_correct(answer);
    let signal = self.choice_run.answer(correct);
    if signal != AnswerSignal::Ignored {
      self.last_choice = Some(answer.to_string());
    }
    self.signal(signal)
  }

  /// Leave the preview of the current sentence and show the word pool
  pub fn begin_assembly(&mut self) -> bool {
    if self.finished || self.phase != Phase::SentenceBuilding || self.stage != SentenceStage::Preview {
      return false;
    }
    let Some(question) = self.sentence_run.current().and_then(|i| self.sentences.get(i)) else {
      return false;
    };
    self
      .boards
      .entry(question.id)
      .or_insert_with(|| WordBoard::new(&question.words));
    self.stage = SentenceStage::Assemble;
    true
  }

  fn open_board(&mut self) -> Option<&mut WordBoard> {
    if self.phase != Phase::SentenceBuilding
      || self.stage != SentenceStage::Assemble
      || self.sentence_run.answered().is_some()
    {
      return None;
    }
    let id = self.sentences.get(self.sentence_run.current()?)?.id;
    self.boards.get_mut(&id)
  }

  pub fn select_word(&mut self, position: usize) -> bool {
    self.open_board().is_some_and(|board| board.select(position))
  }

  pub fn return_word(&mut self, position: usize) -> bool {
    self.open_board().is_some_and(|board| board.unselect(position))
  }

  /// Grade the assembled sentence
  pub fn submit_sentence(&mut self) -> PracticeSignal {
    let Some(assembled) = self.open_board().map(|board| board.sentence()) else {
      return PracticeSignal::Ignored;
    };
    let Some(question) = self.sentence_run.current().and_then(|i| self.sentences.get(i)) else {
      return PracticeSignal::Ignored;
    };
    let correct = grade_sentence(&assembled, &question.correct_sentence);
    let signal = self.sentence_run.answer(correct);
    self.signal(signal)
  }

  fn signal(&mut self, signal: AnswerSignal) -> PracticeSignal {
    match signal {
      AnswerSignal::Ignored => PracticeSignal::Ignored,
      AnswerSignal::Incorrect => PracticeSignal::Incorrect,
      AnswerSignal::Correct => PracticeSignal::Correct,
      AnswerSignal::Complete => match self.phase {
        Phase::MultipleChoice if !self.sentences.is_empty() => {
          PracticeSignal::PhaseComplete(Phase::MultipleChoice)
        }
        _ => {
          self.finish();
          PracticeSignal::SessionComplete
        }
      },
    }
  }

  /// Move on after an answered drill; switches phase once the first is done.
  pub fn advance(&mut self) -> bool {
    if self.finished {
      return false;
    }
    match self.phase {
      Phase::MultipleChoice => {
        if self.choice_run.answered().is_none() {
          return false;
        }
        self.last_choice = None;
        if self.choice_run.advance().is_none() {
          if self.sentences.is_empty() {
            self.finish();
          } else {
            self.phase = Phase::SentenceBuilding;
            self.stage = SentenceStage::Preview;
          }
        }
        true
      }
      Phase::SentenceBuilding => {
        if self.sentence_run.answered().is_none() {
          return false;
        }
        self.stage = SentenceStage::Preview;
        if self.sentence_run.advance().is_none() {
          self.finish();
        }
        true
      }
    }
  }

  fn finish(&mut self) {
    self.finished = true;
    self.boards.clear();
  }
}

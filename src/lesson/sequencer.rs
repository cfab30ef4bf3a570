//! Lesson navigation as a pure reducer.
//!
//! `LessonState::reduce` never performs I/O. Persistence and prompts come
//! back as [`LessonEffect`]s which the caller dispatches after installing the
//! new state.

use std::sync::Arc;

use crate::domain::{
  Flashcard, PracticeRange, ProgressState, Timeline, TimelineStep, UserChoice,
};

use super::timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonEvent {
  Next,
  Prev,
  Reset,
  Choose(UserChoice),
  /// The drill for this group was cleared. The cursor only moves on when it
  /// still sits on that drill.
  PracticeCompleted(PracticeRange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonEffect {
  /// Persist this snapshot (fire-and-forget)
  SaveProgress(ProgressState),
  /// Ask the learner: continue into the drill, or review the group
  PromptTransition(PracticeRange),
  /// The end of the timeline was reached
  Finished,
}

#[derive(Debug, Clone)]
pub struct LessonState {
  pub subtopic_id: i64,
  pub flashcards: Arc<[Flashcard]>,
  pub timeline: Timeline,
  /// Always within `[0, len-1]`, 0 for an empty timeline
  pub position: usize,
  pub progress: ProgressState,
  /// Pending continue/review question
  pub prompt: Option<PracticeRange>,
  pub finished: bool,
}

impl LessonState {
  pub fn new(
    subtopic_id: i64,
    flashcards: Vec<Flashcard>,
    grouping: Option<&[PracticeRange]>,
    progress: ProgressState,
  ) -> Self {
    let timeline = timeline::build(flashcards.len(), grouping, &progress);
    Self {
      subtopic_id,
      flashcards: flashcards.into(),
      timeline,
      position: 0,
      progress,
      prompt: None,
      finished: false,
    }
  }

  pub fn current_step(&self) -> Option<&TimelineStep> {
    self.timeline.get(self.position)
  }

  pub fn current_flashcard(&self) -> Option<&Flashcard> {
    self
      .current_step()
      .and_then(TimelineStep::flashcard_index)
      .and_then(|index| self.flashcards.get(index))
  }

  pub fn current_practice(&self) -> Option<PracticeRange> {
    self.current_step().and_then(TimelineStep::practice_range)
  }

  /// Cards covered by a drill
  pub fn cards_in(&self, range: PracticeRange) -> &[Flashcard] {
    let end = range.end.min(self.flashcards.len());
    let start = range.start.min(end);
    &self.flashcards[start..end]
  }

  pub fn completed_card_count(&self) -> usize {
    self
      .flashcards
      .iter()
      .filter(|c| self.progress.is_flashcard_completed(c.id))
      .count()
  }

  pub fn is_first_position(&self) -> bool {
    self.position == 0
  }

  /// Apply one event, returning the next state and the effects to dispatch.
  pub fn reduce(&self, event: LessonEvent) -> (LessonState, Vec<LessonEffect>) {
    let mut next = self.clone();
    let mut effects = Vec::new();

    if next.timeline.is_empty() {
      if event == LessonEvent::Next {
        next.finished = true;
        effects.push(LessonEffect::Finished);
      }
      return (next, effects);
    }

    match event {
      LessonEvent::Next => next.next(&mut effects),
      LessonEvent::Prev => {
        next.prompt = None;
        next.finished = false;
        next.prev();
      }
      LessonEvent::Reset => {
        next.position = 0;
        next.prompt = None;
        next.finished = false;
      }
      LessonEvent::Choose(choice) => next.choose(choice, &mut effects),
      LessonEvent::PracticeCompleted(range) => next.practice_completed(range, &mut effects),
    }

    (next, effects)
  }

  fn next(&mut self, effects: &mut Vec<LessonEffect>) {
    if let Some(range) = self.prompt {
      // Still waiting on the learner
      effects.push(LessonEffect::PromptTransition(range));
      return;
    }

    match self.timeline.get(self.position).copied() {
      Some(TimelineStep::Flashcard { index }) => {
        if let Some(card) = self.flashcards.get(index)
          && self.progress.mark_flashcard(card.id)
        {
          effects.push(LessonEffect::SaveProgress(self.progress.clone()));
        }

        if let Some(target) = self.next_card_in_group(index) {
          self.position = target;
          return;
        }

        match self.timeline.get(self.position + 1).copied() {
          Some(TimelineStep::Practice(range)) if !self.progress.is_practice_completed(range) => {
            self.prompt = Some(range);
            effects.push(LessonEffect::PromptTransition(range));
          }
          Some(TimelineStep::Practice(_)) => self.advance_past(self.position + 1, effects),
          _ => self.advance_past(self.position, effects),
        }
      }
      Some(TimelineStep::Practice(_)) => self.advance_past(self.position, effects),
      None => self.finish(effects),
    }
  }

  /// Next flashcard of the current group, stopping at the first drill
  fn next_card_in_group(&self, index: usize) -> Option<usize> {
    self.timeline.steps()[self.position + 1..]
      .iter()
      .take_while(|step| !step.is_practice())
      .position(|step| step.flashcard_index().is_some_and(|i| i > index))
      .map(|offset| self.position + 1 + offset)
  }

  /// Move to the first step after `from` that is not an already completed drill
  fn advance_past(&mut self, from: usize, effects: &mut Vec<LessonEffect>) {
    let target = self.timeline.steps()[(from + 1).min(self.timeline.len())..]
      .iter()
      .position(|step| match step {
        TimelineStep::Practice(range) => !self.progress.is_practice_completed(*range),
        TimelineStep::Flashcard { .. } => true,
      })
      .map(|offset| from + 1 + offset);

    match target {
      Some(position) => self.position = position,
      None => self.finish(effects),
    }
  }

  fn practice_completed(&mut self, range: PracticeRange, effects: &mut Vec<LessonEffect>) {
    if !self.timeline.steps().contains(&TimelineStep::Practice(range)) {
      return;
    }
    if self.progress.mark_practice(range) {
      effects.push(LessonEffect::SaveProgress(self.progress.clone()));
    }
    if self.prompt == Some(range) {
      self.prompt = None;
    }
    if self.current_practice() == Some(range) {
      self.advance_past(self.position, effects);
    }
  }

  fn finish(&mut self, effects: &mut Vec<LessonEffect>) {
    self.finished = true;
    effects.push(LessonEffect::Finished);
  }

  fn prev(&mut self) {
    let steps = self.timeline.steps();
    match steps.get(self.position).copied() {
      Some(TimelineStep::Flashcard { index }) => {
        if let Some(target) = steps[..self.position]
          .iter()
          .rposition(|step| step.flashcard_index().is_some_and(|i| i < index))
        {
          self.position = target;
        }
      }
      Some(TimelineStep::Practice(_)) => {
        self.position = steps[..self.position]
          .iter()
          .rposition(|step| !step.is_practice())
          .unwrap_or(0);
      }
      None => self.position = 0,
    }
  }

  fn choose(&mut self, choice: UserChoice, effects: &mut Vec<LessonEffect>) {
    let Some(range) = self.prompt.take() else {
      return;
    };
    self.progress.user_choice = Some(choice);

    let target = match choice {
      UserChoice::Continue => self
        .timeline
        .steps()
        .iter()
        .position(|step| *step == TimelineStep::Practice(range)),
      UserChoice::Review => self.timeline.position_of_flashcard(range.start),
    };
    if let Some(position) = target {
      self.position = position;
    }
    effects.push(LessonEffect::SaveProgress(self.progress.clone()));
  }
}

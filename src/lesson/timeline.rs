//! Timeline construction for a sub-unit.
//!
//! Cards are split into groups; every group of two or more cards is followed
//! by a practice drill over exactly that group. The grouping comes from the
//! backend when it sends a usable one, otherwise from [`fallback_groups`].
//!
//! Existing learner records reference drills by their `"start-end"` key, so
//! the fallback grouping must stay stable: changing it orphans saved progress.

use crate::domain::{PracticeRange, ProgressState, Timeline, TimelineStep};

/// Number of groups the fallback splits `count` cards into
pub fn fallback_group_count(count: usize) -> usize {
  match count {
    0..=6 => 2,
    7..=9 => 3,
    _ => 4,
  }
}

/// Local grouping used when the backend provides none.
///
/// `size = ceil(count / groups)`; the last group takes the remainder and may
/// be shorter (or a singleton).
pub fn fallback_groups(count: usize) -> Vec<PracticeRange> {
  if count == 0 {
    return Vec::new();
  }
  let size = count.div_ceil(fallback_group_count(count));
  (0..count)
    .step_by(size)
    .map(|start| PracticeRange::new(start, (start + size).min(count)))
    .collect()
}

/// Check that `groups` is a contiguous, gap-free partition of `0..count`
pub fn is_valid_grouping(groups: &[PracticeRange], count: usize) -> bool {
  if groups.is_empty() {
    return count == 0;
  }
  let mut expected_start = 0;
  for group in groups {
    if group.start != expected_start || group.is_empty() {
      return false;
    }
    expected_start = group.end;
  }
  expected_start == count
}

/// Build the play order for `count` flashcards.
///
/// Drills already present in `progress` are left out; every card is still
/// included exactly once.
pub fn build(count: usize, grouping: Option<&[PracticeRange]>, progress: &ProgressState) -> Timeline {
  let groups = match grouping {
    Some(groups) if is_valid_grouping(groups, count) => groups.to_vec(),
    Some(groups) => {
      tracing::debug!(
        "Ignoring backend grouping ({} groups) that does not cover {} cards",
        groups.len(),
        count
      );
      fallback_groups(count)
    }
    None => fallback_groups(count),
  };

  let mut steps = Vec::with_capacity(count + groups.len());
  for group in groups {
    steps.extend(group.as_range().map(|index| TimelineStep::Flashcard { index }));
    if group.len() >= 2 && !progress.is_practice_completed(group) {
      steps.push(TimelineStep::Practice(group));
    }
  }
  Timeline::new(steps)
}

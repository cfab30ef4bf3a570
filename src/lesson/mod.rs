//! Lesson player: timeline construction, navigation and end-of-unit routing.

pub mod completion;
pub mod sequencer;
pub mod timeline;

pub use completion::CompletionRoute;
pub use sequencer::{LessonEffect, LessonEvent, LessonState};

pub mod account;
pub mod flashcard;
pub mod progress;
pub mod question;
pub mod timeline;
pub mod topic;

pub use account::{Profile, Role, SessionUser, UserAccount};
pub use flashcard::Flashcard;
pub use progress::{ProgressState, UserChoice};
pub use question::{
  AnswerOption, MultipleChoiceQuestion, PracticeQuestion, SentenceQuestion, TestResult,
};
pub use timeline::{PracticeRange, Timeline, TimelineStep};
pub use topic::{NextSubtopic, SubtopicSummary, Topic};

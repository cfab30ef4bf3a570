//! Practice engine: drill serving, grading and retry handling.

pub mod board;
pub mod exam;
pub mod retry;
pub mod session;

pub use board::{grade_sentence, WordBoard, WordWithPosition};
pub use exam::ExamSession;
pub use retry::{AnswerSignal, PhaseRun, RetryQueue};
pub use session::{CurrentDrill, Phase, PracticeSession, PracticeSignal, SentenceStage};

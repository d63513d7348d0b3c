//! notewise-quiz: the quiz session state machine and its controller.
//!
//! This crate provides:
//! - `QuizSession` - a pure select/reveal/advance cycle over a fixed question list
//! - `QuizController` - drives a session against a `NotesApi`, persisting
//!   answers best-effort and discarding results from superseded sessions
//! - `percentage` and `ScoreBand` for the results screen
//! - `generate_summary` for note summaries

pub mod controller;
pub mod score;
pub mod session;
pub mod summary;

pub use controller::{GenerationOutcome, PendingGeneration, QuizController};
pub use score::{ScoreBand, percentage};
pub use session::{AnswerRecord, AnswerSubmission, OptionState, QuizPhase, QuizSession};
pub use summary::generate_summary;

//! The quiz session state machine.
//!
//! A session walks a fixed list of questions strictly in order:
//! select an option (which reveals the answer), then advance. Nothing here
//! touches the network; [`select_option`](QuizSession::select_option) hands
//! back the attempt to persist and the caller decides how to send it.

use notewise_common::{QuizAttempt, QuizData, QuizId, QuizQuestion};
use serde::Serialize;

use crate::score::{ScoreBand, percentage};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub prompt: String,
    pub was_correct: bool,
}

impl AnswerRecord {
    pub fn new(prompt: impl Into<String>, was_correct: bool) -> Self {
        Self {
            prompt: prompt.into(),
            was_correct,
        }
    }
}

/// Where the session is in its question cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum QuizPhase {
    /// No quiz loaded.
    Idle,
    /// Waiting for an answer to question `index`.
    InProgress { index: usize },
    /// Question `index` has been answered and its result is showing.
    Revealed { index: usize },
    /// Every question has been answered and advanced past.
    Finished,
}

/// How an option should be presented for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// Not yet answered; the option can be picked.
    Selectable,
    /// Revealed as the correct answer.
    Correct,
    /// Picked, but wrong.
    Incorrect,
    /// Revealed, neither picked nor correct.
    Dimmed,
}

/// An attempt to report to the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub quiz_id: QuizId,
    pub attempt: QuizAttempt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedQuiz {
    id: QuizId,
    questions: Vec<QuizQuestion>,
}

/// A single learner's pass through one generated quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    quiz: Option<LoadedQuiz>,
    current_index: usize,
    score: usize,
    answer_log: Vec<AnswerRecord>,
    selected_option: Option<String>,
    revealed: bool,
}

impl QuizSession {
    /// An idle session with no quiz.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session over `data`, idle if it has no questions.
    pub fn from_data(data: QuizData) -> Self {
        let mut session = Self::new();
        session.load(data);
        session
    }

    /// Replace everything with a fresh quiz, starting at the first question.
    ///
    /// Quiz data with no questions counts as no quiz: the session is left
    /// idle and `false` is returned.
    pub fn load(&mut self, data: QuizData) -> bool {
        self.clear();
        if data.questions.is_empty() {
            tracing::debug!(quiz_id = %data.quiz_id, "quiz has no questions, staying idle");
            return false;
        }
        tracing::debug!(
            quiz_id = %data.quiz_id,
            questions = data.questions.len(),
            "quiz loaded"
        );
        self.quiz = Some(LoadedQuiz {
            id: data.quiz_id,
            questions: data.questions,
        });
        true
    }

    /// Drop the quiz and all progress.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> QuizPhase {
        match &self.quiz {
            None => QuizPhase::Idle,
            Some(quiz) if self.current_index >= quiz.questions.len() => QuizPhase::Finished,
            Some(_) if self.revealed => QuizPhase::Revealed {
                index: self.current_index,
            },
            Some(_) => QuizPhase::InProgress {
                index: self.current_index,
            },
        }
    }

    pub fn quiz_id(&self) -> Option<&QuizId> {
        self.quiz.as_ref().map(|q| &q.id)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        self.quiz.as_ref().map_or(&[], |q| q.questions.as_slice())
    }

    pub fn total(&self) -> usize {
        self.questions().len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == QuizPhase::Finished
    }

    /// The question being shown, if any.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions().get(self.current_index)
    }

    /// Answer the current question with `option`.
    ///
    /// Ignored when there is no quiz, when the quiz is finished, or when the
    /// current question has already been answered. Otherwise the answer is
    /// scored and logged immediately and the attempt to persist is returned.
    pub fn select_option(&mut self, option: &str) -> Option<AnswerSubmission> {
        if self.revealed {
            return None;
        }
        let quiz = self.quiz.as_ref()?;
        let question = quiz.questions.get(self.current_index)?;

        let was_correct = question.is_correct(option);
        let submission = AnswerSubmission {
            quiz_id: quiz.id.clone(),
            attempt: QuizAttempt {
                selected_option: option.to_owned(),
                correct_option: question.correct_option.clone(),
                question_index: self.current_index,
            },
        };
        self.answer_log
            .push(AnswerRecord::new(question.prompt.clone(), was_correct));
        if was_correct {
            self.score += 1;
        }
        self.selected_option = Some(option.to_owned());
        self.revealed = true;

        tracing::debug!(
            index = self.current_index,
            was_correct,
            score = self.score,
            "answer recorded"
        );
        Some(submission)
    }

    /// Move past a revealed question. Returns `false` unless the current
    /// question has been answered.
    pub fn advance(&mut self) -> bool {
        if !self.revealed {
            return false;
        }
        self.current_index += 1;
        self.selected_option = None;
        self.revealed = false;
        if self.is_finished() {
            tracing::debug!(score = self.score, total = self.total(), "quiz finished");
        }
        true
    }

    /// Final percentage, only once finished.
    pub fn percentage_score(&self) -> Option<u32> {
        self.is_finished()
            .then(|| percentage(self.score, self.total()))
    }

    /// Percentage of the whole quiz answered correctly so far.
    pub fn running_percentage(&self) -> u32 {
        percentage(self.score, self.total())
    }

    pub fn band(&self) -> Option<ScoreBand> {
        self.percentage_score().map(ScoreBand::from_percentage)
    }

    /// One-based position of the current question and the total, for a
    /// progress indicator. `None` when idle or finished.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.current_question()
            .map(|_| (self.current_index + 1, self.total()))
    }

    /// Presentation state of `option` for the current question.
    pub fn option_state(&self, option: &str) -> OptionState {
        let Some(question) = self.current_question() else {
            return OptionState::Dimmed;
        };
        if !self.revealed {
            return OptionState::Selectable;
        }
        if question.is_correct(option) {
            OptionState::Correct
        } else if self.selected_option.as_deref() == Some(option) {
            OptionState::Incorrect
        } else {
            OptionState::Dimmed
        }
    }
}

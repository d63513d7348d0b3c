//! Drives a [`QuizSession`] against the remote notes API.
//!
//! Local transitions never wait on the network. Answer persistence runs as a
//! detached task; quiz generation is split into request, resolve and apply so
//! a UI loop can keep handling input while the request is in flight.
//!
//! Every load or restart bumps an epoch shared with outstanding work. A
//! generation result or persistence failure carrying an older epoch belongs
//! to a superseded session and is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use n0_future::task::{self, JoinHandle};
use notewise_common::{
    ApiError, NoteId, NotesApi, Notification, NotificationSender, Notifier, QuizData, messages,
};

use crate::session::{AnswerSubmission, QuizSession};

/// A quiz generation request that has been issued but not yet awaited.
#[derive(Debug)]
#[must_use = "a pending generation does nothing until resolved and applied"]
pub struct PendingGeneration<A> {
    api: Arc<A>,
    note_id: NoteId,
    ticket: u64,
}

impl<A: NotesApi> PendingGeneration<A> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Perform the remote call.
    pub async fn resolve(self) -> GenerationOutcome {
        let result = self.api.generate_quiz(&self.note_id).await;
        GenerationOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// Result of a generation request, tagged with the epoch it was issued in.
#[derive(Debug)]
pub struct GenerationOutcome {
    ticket: u64,
    result: Result<QuizData, ApiError>,
}

impl GenerationOutcome {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

pub struct QuizController<A, N = NotificationSender> {
    api: Arc<A>,
    note_id: NoteId,
    session: QuizSession,
    epoch: Arc<AtomicU64>,
    notifier: N,
    loading: bool,
}

impl<A, N> QuizController<A, N>
where
    A: NotesApi + 'static,
    N: Notifier + Clone + Send + 'static,
{
    pub fn new(api: Arc<A>, note_id: NoteId, notifier: N) -> Self {
        Self {
            api,
            note_id,
            session: QuizSession::new(),
            epoch: Arc::new(AtomicU64::new(0)),
            notifier,
            loading: false,
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    /// A generation request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Load quiz data handed over by a container, replacing any session.
    ///
    /// Empty quiz data leaves the controller idle.
    pub fn supply(&mut self, data: QuizData) -> bool {
        self.bump_epoch();
        self.loading = false;
        self.session.load(data)
    }

    /// Issue a generation request. Any earlier outstanding request becomes stale.
    pub fn request_quiz(&mut self) -> PendingGeneration<A> {
        let ticket = self.bump_epoch();
        self.loading = true;
        tracing::debug!(note_id = %self.note_id, ticket, "requesting quiz");
        PendingGeneration {
            api: self.api.clone(),
            note_id: self.note_id.clone(),
            ticket,
        }
    }

    /// Apply a resolved generation. Returns `true` if a new quiz was loaded.
    ///
    /// Stale outcomes are ignored without notifying. A failure leaves the
    /// session as it was before the request.
    pub fn apply_generation(&mut self, outcome: GenerationOutcome) -> bool {
        if outcome.ticket != self.current_epoch() {
            tracing::debug!(ticket = outcome.ticket, "discarding stale quiz generation");
            return false;
        }
        self.loading = false;
        match outcome.result {
            Ok(data) => {
                self.bump_epoch();
                let loaded = self.session.load(data);
                tracing::info!(note_id = %self.note_id, loaded, "quiz generated");
                self.notifier
                    .notify(Notification::success(messages::QUIZ_GENERATED));
                loaded
            }
            Err(err) => {
                tracing::warn!(note_id = %self.note_id, error = %err, "quiz generation failed");
                self.notifier.notify(Notification::error(messages::QUIZ_FAILED));
                false
            }
        }
    }

    /// Request, await and apply a fresh quiz.
    pub async fn generate(&mut self) -> bool {
        let outcome = self.request_quiz().resolve().await;
        self.apply_generation(outcome)
    }

    /// Throw away the current quiz and all progress, then generate a new one.
    pub async fn restart(&mut self) -> bool {
        self.session.clear();
        self.generate().await
    }

    /// Answer the current question.
    ///
    /// The session is updated before anything is sent. The attempt is then
    /// persisted on a detached task whose handle is returned; a failure only
    /// raises a notification, and only if the session has not been replaced.
    pub fn select_option(&mut self, option: &str) -> Option<JoinHandle<()>> {
        let submission = self.session.select_option(option)?;
        Some(self.persist(submission))
    }

    /// Move to the next question. See [`QuizSession::advance`].
    pub fn advance(&mut self) -> bool {
        self.session.advance()
    }

    fn persist(&self, submission: AnswerSubmission) -> JoinHandle<()> {
        let api = self.api.clone();
        let notifier = self.notifier.clone();
        let epoch = self.epoch.clone();
        let ticket = self.current_epoch();
        task::spawn(async move {
            let AnswerSubmission { quiz_id, attempt } = submission;
            match api.record_quiz_answer(&quiz_id, &attempt).await {
                Ok(()) => {
                    tracing::trace!(%quiz_id, index = attempt.question_index, "attempt saved");
                }
                Err(err) => {
                    tracing::warn!(
                        %quiz_id,
                        index = attempt.question_index,
                        error = %err,
                        "failed to save quiz attempt"
                    );
                    if epoch.load(Ordering::SeqCst) == ticket {
                        notifier.notify(Notification::error(messages::ATTEMPT_FAILED));
                    }
                }
            }
        })
    }
}

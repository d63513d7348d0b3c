//! notewise-common: wire types, the remote notes API, and shared plumbing.
//!
//! This crate provides:
//! - `NotesApi` trait for the remote collaborator, with `HttpNotesApi` over reqwest
//! - Wire types for notes, quizzes, attempts and summaries
//! - `ApiError` and friends, flattened to "operation failed" for notifications
//! - `ApiConfig` with file and environment loading
//! - Notification channel for transient toasts

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod types;

pub use client::{HttpNotesApi, NotesApi};
pub use config::{ApiConfig, FileStore, Loader, Saver};
pub use error::{ApiError, ConfigError, NoteValidationError};
pub use notify::{
    Notification, NotificationLevel, NotificationReceiver, NotificationSender, Notifier, messages,
};
pub use types::{Note, NoteId, NotePayload, QuizAttempt, QuizData, QuizId, QuizQuestion, Summary};

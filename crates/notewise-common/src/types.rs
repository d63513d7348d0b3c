//! Wire types exchanged with the notes API.
//!
//! Field names follow the server's camelCase JSON. The structured document
//! tree travels as an opaque `serde_json::Value`; the editor crate owns its
//! typed form.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(id: impl Into<SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(SmolStr::from(s))
            }
        }
    };
}

id_type!(
    /// Server-assigned note identifier.
    NoteId
);
id_type!(
    /// Server-assigned quiz instance identifier.
    QuizId
);

/// A persisted note as returned by `GET /notes/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id", alias = "id")]
    pub id: NoteId,
    pub title: String,
    /// Canonical HTML, authoritative for display and PDF export.
    #[serde(default)]
    pub html: String,
    /// Structured document tree produced by the editor.
    #[serde(default, rename = "json")]
    pub tree: Option<serde_json::Value>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for create and update calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub title: String,
    pub html: String,
    #[serde(rename = "json")]
    pub tree: Option<serde_json::Value>,
    pub subject_id: String,
}

/// One multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_option: String,
}

impl QuizQuestion {
    /// Number of candidate answers the generator produces per question.
    pub const OPTION_COUNT: usize = 4;

    pub fn is_correct(&self, option: &str) -> bool {
        option == self.correct_option
    }
}

/// A freshly generated quiz, or one supplied by a container page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
    pub quiz_id: QuizId,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

/// Body of the per-answer persistence call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    #[serde(rename = "userAnswer")]
    pub selected_option: String,
    #[serde(rename = "correctAnswer")]
    pub correct_option: String,
    #[serde(rename = "quizIndex")]
    pub question_index: usize,
}

/// AI-generated summary of a note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(alias = "summaryText")]
    pub summary: String,
}

/// Envelope for `GET /notes/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct NoteEnvelope {
    pub note: Note,
}

/// Envelope for `POST /notes`.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedEnvelope {
    pub note: CreatedNote,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedNote {
    #[serde(rename = "_id", alias = "id")]
    pub id: NoteId,
}

/// Envelope for `GET /notes/{id}/pdf`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PdfEnvelope {
    #[serde(default)]
    pub pdf_url: Option<String>,
}

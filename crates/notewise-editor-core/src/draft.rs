//! A note being edited, and its save/load round trip with the notes API.
//!
//! [`NoteDraft`] is also a [`ContentSink`]: hand it to an [`EditorSync`] and
//! it keeps the latest HTML and tree ready to send upstream.

use notewise_common::{
    ApiError, Note, NoteId, NotePayload, NoteValidationError, NotesApi, Notification, Notifier,
    messages,
};

use crate::state::EditorConfig;
use crate::sync::{ContentSink, EditorSync};
use crate::tree::Node;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub subject_id: String,
    pub html: String,
    /// Serialized [`Node`] tree, as stored on the server.
    pub tree: Option<serde_json::Value>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject_id: subject_id.into(),
            ..Default::default()
        }
    }

    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            subject_id: note.subject_id.clone().unwrap_or_default(),
            html: note.html.clone(),
            tree: note.tree.clone(),
        }
    }

    /// Request body for create/update. The title must not be blank.
    pub fn payload(&self) -> Result<NotePayload, NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::MissingTitle);
        }
        Ok(NotePayload {
            title: self.title.clone(),
            html: self.html.clone(),
            tree: self.tree.clone(),
            subject_id: self.subject_id.clone(),
        })
    }

    /// Hand the draft to an editor hydrated from its HTML. Later edits flow
    /// back into the draft.
    pub fn into_editor(self, config: EditorConfig) -> EditorSync<NoteDraft> {
        let html = self.html.clone();
        EditorSync::initialize(&html, config, self)
    }

    /// Copy an editor's current content into the draft.
    pub fn capture<S: ContentSink>(&mut self, editor: &EditorSync<S>) {
        self.html_changed(editor.html());
        self.tree_changed(editor.tree());
    }

    /// Fetch a note into a draft. Failure notifies and yields `None`.
    pub async fn load<A, N>(api: &A, id: &NoteId, notifier: &N) -> Option<NoteDraft>
    where
        A: NotesApi,
        N: Notifier,
    {
        match api.get_note(id).await {
            Ok(note) => {
                tracing::debug!(%id, title = %note.title, "note loaded");
                Some(Self::from_note(&note))
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "failed to load note");
                notifier.notify(Notification::error(messages::NOTE_LOAD_FAILED));
                None
            }
        }
    }

    /// Update the note with `id`, or create a new one when there is none.
    ///
    /// Returns the note's identifier on success. Every outcome, including a
    /// blank title, produces a notification.
    pub async fn save<A, N>(&self, api: &A, id: Option<&NoteId>, notifier: &N) -> Option<NoteId>
    where
        A: NotesApi,
        N: Notifier,
    {
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "refusing to save");
                notifier.notify(Notification::error(messages::NOTE_TITLE_MISSING));
                return None;
            }
        };

        let result: Result<(NoteId, &'static str), ApiError> = match id {
            Some(id) => api
                .update_note(id, &payload)
                .await
                .map(|_| (id.clone(), messages::NOTE_UPDATED)),
            None => api
                .create_note(&payload)
                .await
                .map(|id| (id, messages::NOTE_CREATED)),
        };

        match result {
            Ok((id, message)) => {
                tracing::info!(%id, "note saved");
                notifier.notify(Notification::success(message));
                Some(id)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save note");
                notifier.notify(Notification::error(messages::NOTE_SAVE_FAILED));
                None
            }
        }
    }
}

impl ContentSink for NoteDraft {
    fn html_changed(&mut self, html: &str) {
        self.html.clear();
        self.html.push_str(html);
    }

    fn tree_changed(&mut self, tree: &Node) {
        match serde_json::to_value(tree) {
            Ok(value) => self.tree = Some(value),
            Err(e) => tracing::warn!(error = %e, "could not serialize document tree"),
        }
    }
}

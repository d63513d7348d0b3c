//! Note summaries, the other AI study aid next to quizzes.

use notewise_common::{NoteId, NotesApi, Notification, Notifier, Summary, messages};

/// Ask the remote collaborator to summarise a note.
///
/// Failures are logged and notified; the caller only learns whether a
/// summary came back.
pub async fn generate_summary<A, N>(api: &A, note_id: &NoteId, notifier: &N) -> Option<Summary>
where
    A: NotesApi,
    N: Notifier,
{
    match api.generate_summary(note_id).await {
        Ok(summary) => {
            tracing::info!(%note_id, len = summary.summary.len(), "summary generated");
            notifier.notify(Notification::success(messages::SUMMARY_GENERATED));
            Some(summary)
        }
        Err(err) => {
            tracing::warn!(%note_id, error = %err, "summary generation failed");
            notifier.notify(Notification::error(messages::SUMMARY_FAILED));
            None
        }
    }
}

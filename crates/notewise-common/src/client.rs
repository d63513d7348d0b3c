//! Remote notes API: the collaborator trait and its reqwest implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{
    CreatedEnvelope, Note, NoteEnvelope, NoteId, NotePayload, PdfEnvelope, QuizAttempt, QuizData,
    QuizId, Summary,
};

/// Request/response operations the editor and quiz components depend on.
///
/// Every call either succeeds or fails with an [`ApiError`]; callers only
/// distinguish the two outcomes when notifying the user.
pub trait NotesApi: Send + Sync {
    /// Fetch a note by identifier.
    fn get_note(&self, id: &NoteId) -> impl Future<Output = Result<Note, ApiError>> + Send;

    /// Create a note, returning its new identifier.
    fn create_note(
        &self,
        payload: &NotePayload,
    ) -> impl Future<Output = Result<NoteId, ApiError>> + Send;

    /// Replace a note's content. Any response body is ignored.
    fn update_note(
        &self,
        id: &NoteId,
        payload: &NotePayload,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete a note permanently.
    fn delete_note(&self, id: &NoteId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Render a note to PDF server-side. `None` when the server produced no URL.
    fn export_pdf(
        &self,
        id: &NoteId,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    /// Generate a fresh quiz for a note.
    fn generate_quiz(
        &self,
        note_id: &NoteId,
    ) -> impl Future<Output = Result<QuizData, ApiError>> + Send;

    /// Record one answered question. The acknowledgement carries nothing.
    fn record_quiz_answer(
        &self,
        quiz_id: &QuizId,
        attempt: &QuizAttempt,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Generate a summary for a note.
    fn generate_summary(
        &self,
        note_id: &NoteId,
    ) -> impl Future<Output = Result<Summary, ApiError>> + Send;
}

/// HTTP client for the notes API.
#[derive(Clone, Debug)]
pub struct HttpNotesApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpNotesApi {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.endpoint)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(config.endpoint.clone()));
        }
        let builder = reqwest::Client::builder();
        #[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
        let builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        let client = builder.build()?;
        Ok(Self {
            client,
            base,
            token: config.token.clone(),
        })
    }

    /// Build a client around an existing reqwest client.
    pub fn with_client(client: reqwest::Client, config: &ApiConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.endpoint)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(config.endpoint.clone()));
        }
        Ok(Self {
            client,
            base,
            token: config.token.clone(),
        })
    }

    /// Join path segments onto the base endpoint, escaping each segment.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.url_for(segments)?;
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "notes api returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.send(req).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl NotesApi for HttpNotesApi {
    async fn get_note(&self, id: &NoteId) -> Result<Note, ApiError> {
        tracing::debug!(note = %id, "fetching note");
        let req = self.request(Method::GET, &["notes", id.as_str()])?;
        let envelope: NoteEnvelope = self.send_json(req).await?;
        Ok(envelope.note)
    }

    async fn create_note(&self, payload: &NotePayload) -> Result<NoteId, ApiError> {
        tracing::debug!(title = %payload.title, "creating note");
        let req = self.request(Method::POST, &["notes"])?.json(payload);
        let envelope: CreatedEnvelope = self.send_json(req).await?;
        Ok(envelope.note.id)
    }

    async fn update_note(&self, id: &NoteId, payload: &NotePayload) -> Result<(), ApiError> {
        tracing::debug!(note = %id, "updating note");
        let req = self
            .request(Method::PUT, &["notes", id.as_str()])?
            .json(payload);
        self.send(req).await?;
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<(), ApiError> {
        tracing::debug!(note = %id, "deleting note");
        let req = self.request(Method::DELETE, &["notes", id.as_str()])?;
        self.send(req).await?;
        Ok(())
    }

    async fn export_pdf(&self, id: &NoteId) -> Result<Option<String>, ApiError> {
        let req = self.request(Method::GET, &["notes", id.as_str(), "pdf"])?;
        let envelope: PdfEnvelope = self.send_json(req).await?;
        Ok(envelope.pdf_url.filter(|url| !url.is_empty()))
    }

    async fn generate_quiz(&self, note_id: &NoteId) -> Result<QuizData, ApiError> {
        tracing::debug!(note = %note_id, "requesting quiz generation");
        let req = self.request(Method::GET, &["ai", "quiz", note_id.as_str()])?;
        self.send_json(req).await
    }

    async fn record_quiz_answer(
        &self,
        quiz_id: &QuizId,
        attempt: &QuizAttempt,
    ) -> Result<(), ApiError> {
        let req = self
            .request(Method::POST, &["quiz-attempts", quiz_id.as_str()])?
            .json(attempt);
        self.send(req).await?;
        Ok(())
    }

    async fn generate_summary(&self, note_id: &NoteId) -> Result<Summary, ApiError> {
        tracing::debug!(note = %note_id, "requesting summary generation");
        let req = self.request(Method::GET, &["ai", "summary", note_id.as_str()])?;
        self.send_json(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(endpoint: &str) -> HttpNotesApi {
        let config = ApiConfig {
            endpoint: endpoint.to_owned(),
            ..ApiConfig::default()
        };
        HttpNotesApi::new(&config).unwrap()
    }

    #[test]
    fn test_url_for_joins_segments() {
        let api = api("http://localhost:5000/api/");
        let url = api.url_for(&["ai", "quiz", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/ai/quiz/abc");
    }

    #[test]
    fn test_url_for_without_trailing_slash() {
        let api = api("http://localhost:5000/api");
        let url = api.url_for(&["notes", "n1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/notes/n1");
    }

    #[test]
    fn test_url_for_escapes_ids() {
        let api = api("https://notes.example.com");
        let url = api.url_for(&["notes", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://notes.example.com/notes/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_non_base_endpoint() {
        let config = ApiConfig {
            endpoint: "mailto:someone@example.com".to_owned(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpNotesApi::new(&config),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_https_endpoint_reaches_transport() {
        let api = api("https://127.0.0.1:9/api");
        let url = api.url_for(&["notes", "n1"]).unwrap();
        assert_eq!(url.scheme(), "https");

        let err = api.client.get(url).send().await.unwrap_err();
        let mut chain = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            chain.push_str(&format!(": {inner}"));
            source = inner.source();
        }
        assert!(!chain.contains("scheme is not http"), "{chain}");
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut seen = Vec::new();
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                seen.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&seen) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{addr}/api")
    }

    fn request_complete(seen: &[u8]) -> bool {
        let text = String::from_utf8_lossy(seen);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        seen.len() >= head_end + 4 + length
    }

    fn payload() -> NotePayload {
        NotePayload {
            title: "Cells".into(),
            html: "<p>mitosis</p>".into(),
            tree: None,
            subject_id: "bio".into(),
        }
    }

    #[tokio::test]
    async fn test_update_accepts_empty_body() {
        let endpoint = serve_once("HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n").await;
        let api = api(&endpoint);
        api.update_note(&NoteId::from("n1"), &payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_ignores_bare_body() {
        let endpoint = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 11\r\nconnection: close\r\n\r\n{\"ok\":true}",
        )
        .await;
        let api = api(&endpoint);
        api.update_note(&NoteId::from("n1"), &payload()).await.unwrap();
    }
}

//! HTTP client for the remote RAG backend.
//!
//! One `BackendClient` per authenticated session. The bearer token is
//! attached to every call except the liveness probe; 401 responses map to
//! `BackendError::Unauthorized`, which the shell resolves by sending the
//! user back to sign-in.

use reqwest::multipart;
use reqwest::StatusCode;

use super::types::{AnswerPayload, AnswerRequest, DocumentsPage, ErrorBody};
use super::BackendError;
use crate::config;

/// HTTP client for the backend API.
pub struct BackendClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl BackendClient {
    /// Create a client for the given base URL and bearer token.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        }
    }

    /// Create a client from `LEXORA_BACKEND_URL` (or the default URL).
    pub fn from_env(token: Option<String>) -> Self {
        Self::new(&config::backend_url(), token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token (after sign-in or refresh).
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    // ── Chat ────────────────────────────────────────────────

    /// `POST /chat/answer`: ask the backend a question.
    ///
    /// Returns the raw payload; normalization into a typed message is the
    /// caller's job (`chat::normalize`).
    pub async fn answer(&self, query: &str) -> Result<AnswerPayload, BackendError> {
        let url = format!("{}/chat/answer", self.base_url);
        let response = self
            .authorized(self.http.post(&url))
            .json(&AnswerRequest { query })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = self.check_status(response).await?;
        response
            .json::<AnswerPayload>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    // ── Documents ───────────────────────────────────────────

    /// `POST /documents`: upload a batch of files as one multipart request.
    ///
    /// Returns the backend's confirmation message. All files travel in a
    /// single call; partial ingestion is the backend's concern.
    pub async fn upload_documents(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/documents", self.base_url);

        let mut form = multipart::Form::new();
        for (name, bytes) in files {
            let mime = mime_guess::from_path(&name).first_or_octet_stream();
            let part = multipart::Part::bytes(bytes)
                .file_name(name.clone())
                .mime_str(mime.essence_str())
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
            form = form.part("files", part);
        }

        let response = self
            .authorized(self.http.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = self.check_status(response).await?;
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Ok(body.into_message("Files uploaded and ingested successfully."))
    }

    /// `GET /documents?skip&limit`: list indexed corpus documents.
    pub async fn list_documents(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<DocumentsPage, BackendError> {
        let url = format!("{}/documents?skip={skip}&limit={limit}", self.base_url);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = self.check_status(response).await?;
        response
            .json::<DocumentsPage>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    /// `DELETE /documents/{id}`: remove a document from the corpus.
    pub async fn delete_document(&self, id: i64) -> Result<(), BackendError> {
        let url = format!("{}/documents/{id}", self.base_url);
        let response = self
            .authorized(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        self.check_status(response).await?;
        Ok(())
    }

    // ── Liveness & session ──────────────────────────────────

    /// `GET /healthz`: unauthenticated liveness probe with a short
    /// timeout, suitable for polling.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/healthz", self.base_url);
        match self
            .http
            .get(&url)
            .timeout(config::WAKEUP_REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// `GET /auth/me`: verify the bearer token is still valid.
    pub async fn check_session(&self) -> Result<(), BackendError> {
        let url = format!("{}/auth/me", self.base_url);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        self.check_status(response).await?;
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn classify(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Http(e)
        }
    }

    /// Map non-2xx responses to `Unauthorized` or `Api` with the backend's
    /// own error text extracted from the body.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        let fallback = status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message: body.into_message(&fallback),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/", None);
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn connection_failure_classified() {
        // Nothing listens on this port.
        let client = BackendClient::new("http://127.0.0.1:19999", Some("tok".into()));
        let err = client.answer("hello").await.unwrap_err();
        assert!(
            matches!(err, BackendError::Connection(_)),
            "expected Connection, got: {err}"
        );
    }

    #[tokio::test]
    async fn health_check_false_when_unreachable() {
        let client = BackendClient::new("http://127.0.0.1:19999", None);
        assert!(!client.health_check().await);
    }
}

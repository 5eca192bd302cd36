//! HTTP adapter for the remote book service.
//!
//! This module implements [`BookStore`] over the service's JSON/HTTP surface.
//! All wire-format tolerance lives here and in the serde derives of the
//! domain types; nothing past this boundary sees transport detail.
//!
//! Error mapping:
//!
//! - no response (connect failure, timeout) → [`SyncError::Network`];
//! - non-2xx response → [`SyncError::Remote`] carrying the message from the
//!   body's `error` or `message` field, or a per-operation fallback;
//! - unparseable 2xx body → [`SyncError::Decode`].
//!
//! Every request and response is logged at debug level with method, path,
//! and status, mirroring what you would want from a transport interceptor.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::error::{Result, SyncError};
use crate::domain::{Book, BookDraft, BookPatch, BookQuery, LibraryStats, Note};
use crate::remote::backend::BookStore;
use crate::Config;

/// [`BookStore`] implementation talking to the real service over HTTP.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections and is itself clone-shared.
///
/// # Examples
///
/// ```no_run
/// use shelfsync::remote::{BookStore, HttpBookStore};
/// use shelfsync::Config;
///
/// # async fn demo() -> shelfsync::domain::Result<()> {
/// let store = HttpBookStore::new(&Config::default())?;
/// let books = store.list_books(&Default::default()).await?;
/// println!("{} books", books.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpBookStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookStore {
    /// Builds the adapter from configuration (base URL and request timeout).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] if the underlying HTTP client cannot be
    /// constructed (e.g. no TLS backend available).
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout_secs,
            "HTTP book store initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request, logging it, and maps non-success outcomes into the
    /// error taxonomy. Returns the raw response for the caller to decode.
    async fn send(
        &self,
        method: &'static str,
        path: &str,
        request: reqwest::RequestBuilder,
        fallback: &'static str,
    ) -> Result<reqwest::Response> {
        tracing::debug!(method, path, "api request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(method, path, error = %error, "no response received");
                return Err(transport_error(&error));
            }
        };

        let status = response.status();
        tracing::debug!(method, path, status = status.as_u16(), "api response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Remote {
            status: status.as_u16(),
            message: remote_message(&body, fallback),
        })
    }
}

/// Decodes a successful response body into `T`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| SyncError::Network(format!("failed to read response body: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| SyncError::Decode(format!("unexpected response shape: {e}")))
}

/// Classifies a transport-level failure (no response was received).
fn transport_error(error: &reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Network(format!("request timed out: {error}"))
    } else if error.is_connect() {
        SyncError::Network(format!("connection failed: {error}"))
    } else {
        SyncError::Network(error.to_string())
    }
}

/// Extracts the human-readable message from an error body.
///
/// The service puts it in an `error` field, older deployments in `message`;
/// anything else falls back to the per-operation default.
fn remote_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .or_else(|| value.get("message").and_then(serde_json::Value::as_str))
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Body shape of the cover endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverPayload {
    #[serde(default)]
    cover_image: Option<String>,
}

#[async_trait]
impl BookStore for HttpBookStore {
    async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>> {
        let params = query.params();
        let request = self.client.get(self.url("/books")).query(&params);
        let response = self
            .send("GET", "/books", request, "Failed to load books")
            .await?;
        let books: Vec<Book> = decode(response).await?;
        tracing::debug!(count = books.len(), "book list fetched");
        Ok(books)
    }

    async fn get_book(&self, id: &str) -> Result<Book> {
        let path = format!("/books/{id}");
        let request = self.client.get(self.url(&path));
        let response = self
            .send("GET", &path, request, "Failed to load book")
            .await?;
        decode(response).await
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<Book> {
        let request = self.client.post(self.url("/books")).json(draft);
        let response = self
            .send("POST", "/books", request, "Failed to create book")
            .await?;
        decode(response).await
    }

    async fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Book> {
        let path = format!("/books/{id}");
        let request = self.client.put(self.url(&path)).json(patch);
        let response = self
            .send("PUT", &path, request, "Failed to update book")
            .await?;
        decode(response).await
    }

    async fn delete_book(&self, id: &str) -> Result<()> {
        let path = format!("/books/{id}");
        let request = self.client.delete(self.url(&path));
        self.send("DELETE", &path, request, "Failed to delete book")
            .await?;
        Ok(())
    }

    async fn list_notes(&self, book_id: &str) -> Result<Vec<Note>> {
        let path = format!("/books/{book_id}/notes");
        let request = self.client.get(self.url(&path));
        let response = self
            .send("GET", &path, request, "Failed to load notes")
            .await?;
        decode(response).await
    }

    async fn create_note(&self, book_id: &str, content: &str) -> Result<Note> {
        let path = format!("/books/{book_id}/notes");
        let request = self
            .client
            .post(self.url(&path))
            .json(&serde_json::json!({ "content": content }));
        let response = self
            .send("POST", &path, request, "Failed to add note")
            .await?;
        decode(response).await
    }

    async fn get_cover(&self, book_id: &str) -> Result<Option<String>> {
        let path = format!("/books/{book_id}/cover");
        let request = self.client.get(self.url(&path));
        match self
            .send("GET", &path, request, "Failed to load cover")
            .await
        {
            Ok(response) => {
                let payload: CoverPayload = decode(response).await?;
                Ok(payload.cover_image)
            }
            // A book without a cover is an expected state, not a failure.
            Err(SyncError::Remote { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn set_cover(&self, book_id: &str, cover_image: &str) -> Result<()> {
        let path = format!("/books/{book_id}/cover");
        let request = self
            .client
            .put(self.url(&path))
            .json(&serde_json::json!({ "coverImage": cover_image }));
        self.send("PUT", &path, request, "Failed to update cover")
            .await?;
        Ok(())
    }

    async fn delete_cover(&self, book_id: &str) -> Result<()> {
        let path = format!("/books/{book_id}/cover");
        let request = self.client.delete(self.url(&path));
        self.send("DELETE", &path, request, "Failed to remove cover")
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<LibraryStats> {
        let request = self.client.get(self.url("/stats"));
        let response = self
            .send("GET", "/stats", request, "Failed to load statistics")
            .await?;
        decode(response).await
    }

    async fn reset(&self) -> Result<()> {
        let request = self.client.post(self.url("/reset"));
        self.send("POST", "/reset", request, "Failed to reset data")
            .await?;
        Ok(())
    }
}

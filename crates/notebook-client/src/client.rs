//! Notebook HTTP Client implementation

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use notebook_core::*;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::ask::{AskEventStream, AskStream, AskTransport, StreamError, StreamResult};
use crate::error::{NotebookClientError, Result};

/// Default backend location
pub const DEFAULT_BASE_URL: &str = "http://localhost:5055";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Notebook backend REST client
///
/// Record IDs may be passed with or without their table prefix; they are
/// normalized before use; an ID carrying another table's prefix is
/// rejected with [`NotebookClientError::InvalidId`].
#[derive(Debug, Clone)]
pub struct NotebookClient {
    client: Client,
    /// Same headers, no total timeout (event streams stay open)
    stream_client: Client,
    base_url: Url,
}

impl NotebookClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the backend (e.g., "http://localhost:5055")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, None, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Self::build(base_url, None, timeout, connect_timeout)
    }

    /// Create a client that sends `Authorization: Bearer <token>` with every request
    pub fn with_bearer_token(base_url: &str, token: &str) -> Result<Self> {
        Self::build(
            base_url,
            Some(token),
            DEFAULT_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
    }

    /// Create a client, authenticating only when a token is configured
    pub fn with_auth(base_url: &str, token: Option<&str>) -> Result<Self> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => Self::with_bearer_token(base_url, token),
            None => Self::new(base_url),
        }
    }

    fn build(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let header_value =
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    NotebookClientError::ParseError(format!("Invalid auth token: {}", e))
                })?;
            headers.insert(AUTHORIZATION, header_value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(headers.clone())
            .build()?;

        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NotebookClientError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            stream_client,
            base_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Build an endpoint URL below the base URL.
    ///
    /// Each segment is percent-encoded, so prefixed IDs such as
    /// `notebook:abc` always stay a single path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NotebookClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_with_query(&self, segments: &[&str], key: &str, value: &str) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }

    // =========================================================================
    // Notebooks
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        let url = self.endpoint(&["api", "notebooks"])?;
        debug!("Listing notebooks from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_notebook(&self, notebook_id: &str) -> Result<Notebook> {
        let id = RecordKind::Notebook.checked(notebook_id)?;
        let url = self.endpoint(&["api", "notebooks", &id])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Sources & Notes
    // =========================================================================

    /// List the sources of a notebook
    #[instrument(skip(self))]
    pub async fn list_sources(&self, notebook_id: &str) -> Result<Vec<Source>> {
        let id = RecordKind::Notebook.checked(notebook_id)?;
        let url = self.endpoint_with_query(&["api", "sources"], "notebook_id", &id)?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_source(&self, source_id: &str) -> Result<Source> {
        let id = RecordKind::Source.checked(source_id)?;
        let url = self.endpoint(&["api", "sources", &id])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// List the notes of a notebook
    #[instrument(skip(self))]
    pub async fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>> {
        let id = RecordKind::Notebook.checked(notebook_id)?;
        let url = self.endpoint_with_query(&["api", "notes"], "notebook_id", &id)?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Chat Sessions
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_chat_sessions(&self, notebook_id: &str) -> Result<Vec<ChatSession>> {
        let id = RecordKind::Notebook.checked(notebook_id)?;
        let url = self.endpoint_with_query(&["api", "chat", "sessions"], "notebook_id", &id)?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_chat_session(&self, request: &CreateSessionRequest) -> Result<ChatSession> {
        let url = self.endpoint(&["api", "chat", "sessions"])?;
        let request = CreateSessionRequest {
            notebook_id: RecordKind::Notebook.checked(&request.notebook_id)?,
            ..request.clone()
        };

        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    /// Get a session together with its messages
    #[instrument(skip(self))]
    pub async fn get_chat_session(&self, session_id: &str) -> Result<ChatSessionWithMessages> {
        let id = RecordKind::ChatSession.checked(session_id)?;
        let url = self.endpoint(&["api", "chat", "sessions", &id])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_chat_session(
        &self,
        session_id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<ChatSession> {
        let id = RecordKind::ChatSession.checked(session_id)?;
        let url = self.endpoint(&["api", "chat", "sessions", &id])?;

        let response = self.client.put(url).json(request).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn delete_chat_session(&self, session_id: &str) -> Result<()> {
        let id = RecordKind::ChatSession.checked(session_id)?;
        let url = self.endpoint(&["api", "chat", "sessions", &id])?;

        let response = self.client.delete(url).send().await?;
        self.expect_success(response).await
    }

    /// Send a message in a chat session and get the updated conversation.
    ///
    /// Fills in the default model and enables web search unless the request
    /// says otherwise.
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn send_chat_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse> {
        let url = self.endpoint(&["api", "chat", "execute"])?;
        let request = SendMessageRequest {
            session_id: RecordKind::ChatSession.checked(&request.session_id)?,
            model_override: Some(
                request
                    .model_override
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL_ID.to_string()),
            ),
            notebook_id: request
                .notebook_id
                .as_deref()
                .map(|id| RecordKind::Notebook.checked(id))
                .transpose()?,
            enable_web_search: Some(request.enable_web_search.unwrap_or(true)),
            ..request.clone()
        };

        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    /// Build the prompt context for a notebook
    #[instrument(skip(self, request))]
    pub async fn build_context(
        &self,
        request: &BuildContextRequest,
    ) -> Result<BuildContextResponse> {
        let url = self.endpoint(&["api", "chat", "context"])?;
        let request = BuildContextRequest {
            notebook_id: RecordKind::Notebook.checked(&request.notebook_id)?,
            ..request.clone()
        };

        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Ask & Search
    // =========================================================================

    /// Ask without streaming; returns once the answer is complete
    #[instrument(skip(self, request))]
    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        let url = self.endpoint(&["api", "search", "ask"])?;

        let response = self.client.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Single-pass ask scoped to one notebook
    #[instrument(skip(self))]
    pub async fn ask_simple(&self, question: &str, notebook_id: &str) -> Result<AskResponse> {
        let url = self.endpoint(&["api", "search", "ask", "simple"])?;
        let request = AskRequest {
            question: question.to_string(),
            notebook_id: Some(RecordKind::Notebook.checked(notebook_id)?),
        };

        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    /// Open the streaming ask endpoint.
    ///
    /// Connection setup is abandoned as soon as `cancel` fires. A non-2xx
    /// status is returned as [`StreamError::Server`] with the body text.
    #[instrument(skip(self, cancel))]
    pub async fn ask_stream(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> StreamResult<AskStream> {
        let url = self
            .endpoint(&["api", "search", "ask"])
            .map_err(|e| StreamError::InvalidUrl(e.to_string()))?;
        debug!("Connecting to ask stream: {}", url);

        let request = self
            .stream_client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&serde_json::json!({ "question": question }))
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            response = request => response?,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Server { status, message });
        }

        Ok(AskStream::from_response(response))
    }

    #[instrument(skip(self, request))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.endpoint(&["api", "search"])?;

        let response = self.client.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Semantic search over sources and notes
    pub async fn vector_search(
        &self,
        query: &str,
        limit: u32,
        minimum_score: f64,
    ) -> Result<SearchResponse> {
        self.search(&SearchRequest::vector(query, limit, minimum_score))
            .await
    }

    // =========================================================================
    // Podcasts
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_podcast_episodes(&self) -> Result<Vec<PodcastEpisode>> {
        let url = self.endpoint(&["api", "podcasts", "episodes"])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_podcast_episode(&self, episode_id: &str) -> Result<PodcastEpisode> {
        let id = RecordKind::Episode.checked(episode_id)?;
        let url = self.endpoint(&["api", "podcasts", "episodes", &id])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// URL of an episode's audio (requires the bearer token if one is set)
    pub fn podcast_audio_url(&self, episode_id: &str) -> Result<Url> {
        let id = RecordKind::Episode.checked(episode_id)?;
        self.endpoint(&["api", "podcasts", "episodes", &id, "audio"])
    }

    /// Download an episode's audio
    #[instrument(skip(self))]
    pub async fn fetch_podcast_audio(&self, episode_id: &str) -> Result<Bytes> {
        let url = self.podcast_audio_url(episode_id)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.bytes().await?)
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    // =========================================================================
    // Insights
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_transformations(&self) -> Result<Vec<Transformation>> {
        let url = self.endpoint(&["api", "transformations"])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn list_source_insights(&self, source_id: &str) -> Result<Vec<SourceInsight>> {
        let id = RecordKind::Source.checked(source_id)?;
        let url = self.endpoint(&["api", "sources", &id, "insights"])?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Run a transformation over a source, producing a new insight
    #[instrument(skip(self))]
    pub async fn create_source_insight(
        &self,
        source_id: &str,
        transformation_id: &str,
    ) -> Result<SourceInsight> {
        let id = RecordKind::Source.checked(source_id)?;
        let url = self.endpoint(&["api", "sources", &id, "insights"])?;
        let request = CreateInsightRequest {
            transformation_id: transformation_id.to_string(),
        };

        let response = self.client.post(url).json(&request).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn delete_insight(&self, insight_id: &str) -> Result<()> {
        let id = RecordKind::Insight.checked(insight_id)?;
        let url = self.endpoint(&["api", "insights", &id])?;

        let response = self.client.delete(url).send().await?;
        self.expect_success(response).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Handle response and deserialize JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| NotebookClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn expect_success(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> NotebookClientError {
        let body = response.text().await.unwrap_or_default();
        // FastAPI-style `{"detail": "..."}` bodies carry the useful part
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or(body);

        match status {
            StatusCode::NOT_FOUND => NotebookClientError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                NotebookClientError::Unauthorized(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                NotebookClientError::Timeout
            }
            _ => NotebookClientError::server_error(status.as_u16(), message),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[async_trait]
impl AskTransport for NotebookClient {
    async fn open(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> StreamResult<AskEventStream> {
        Ok(self.ask_stream(question, cancel).await?.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = NotebookClient::new("http://localhost:5055");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        assert!(NotebookClient::new("not a url").is_err());
        assert!(matches!(
            NotebookClient::new("mailto:someone@example.com"),
            Err(NotebookClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let result = NotebookClient::with_bearer_token("http://localhost:5055", "bad\ntoken");
        assert!(matches!(result, Err(NotebookClientError::ParseError(_))));
    }

    #[test]
    fn test_endpoint_encodes_prefixed_ids() {
        let client = NotebookClient::new("http://localhost:5055").unwrap();
        let url = client
            .endpoint(&["api", "notebooks", "notebook:a/b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5055/api/notebooks/notebook:a%2Fb"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = NotebookClient::new("http://example.com/proxy/").unwrap();
        let url = client.endpoint(&["api", "search", "ask"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/proxy/api/search/ask");
    }

    #[test]
    fn test_podcast_audio_url() {
        let client = NotebookClient::new("http://localhost:5055").unwrap();
        let url = client.podcast_audio_url("e1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5055/api/podcasts/episodes/episode:e1/audio"
        );
    }

    #[test]
    fn test_foreign_prefix_is_rejected() {
        let client = NotebookClient::new("http://localhost:5055").unwrap();
        assert!(matches!(
            client.podcast_audio_url("notebook:n1"),
            Err(NotebookClientError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_prefix_fails_before_request() {
        // Nothing listens here; the ID check must fail first
        let client = NotebookClient::new("http://127.0.0.1:9").unwrap();
        let result = client.get_chat_session("source:s1").await;
        assert!(matches!(result, Err(NotebookClientError::InvalidId(_))));
    }
}

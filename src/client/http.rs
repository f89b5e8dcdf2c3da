//! HTTP implementation of [`ChatBackend`] on top of `reqwest`

use crate::client::{ChatBackend, ChatRequest, ChatResponse, HistoryResponse};
use crate::config::ApiConfig;
use crate::error::{NexusError, Result};
use crate::session::ChatExchange;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

const CHAT_PATH: &str = "chat";
const HISTORY_PATH: &str = "api/chat/history";

/// Client for the CodeNexus chat endpoints
///
/// # Examples
///
/// ```no_run
/// use nexuschat::client::{ChatBackend, ChatRequest, HttpChatClient};
/// use nexuschat::config::ApiConfig;
///
/// # async fn example() -> nexuschat::error::Result<()> {
/// let client = HttpChatClient::new(&ApiConfig::default())?;
/// let reply = client.send_chat(&ChatRequest::new("Hello!", None), None).await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: Client,
    base_url: Url,
}

impl HttpChatClient {
    /// Build a client for `config.base_url`
    ///
    /// When `config.timeout_ms` is set every request carries that deadline;
    /// otherwise the transport default applies.
    ///
    /// # Errors
    ///
    /// Returns [`NexusError::Config`] for an unparsable base URL and
    /// [`NexusError::Http`] if the underlying client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            NexusError::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(NexusError::Http)?;

        tracing::debug!(base_url = %base_url, timeout_ms = ?config.timeout_ms, "Created chat client");

        Ok(Self { client, base_url })
    }

    /// Base URL all endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| NexusError::Config(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Turn a non-success response into an error carrying its body text
    async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body = body.trim();
        let message = if body.is_empty() {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        } else {
            body.to_string()
        };

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("{} rejected credentials: {}", endpoint, message);
            return Err(NexusError::Authentication(message).into());
        }

        tracing::error!("{} returned error {}: {}", endpoint, status, message);
        Err(NexusError::Api {
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn send_chat(&self, request: &ChatRequest, token: Option<&str>) -> Result<String> {
        let url = self.endpoint(CHAT_PATH)?;
        tracing::debug!(
            authenticated = token.is_some(),
            session_id = ?request.session_id,
            "Sending chat message ({} chars)",
            request.content.chars().count()
        );

        let response = Self::authorize(self.client.post(url).json(request), token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat request failed: {}", e);
                NexusError::Http(e)
            })?;

        let response = Self::check_status(response, "POST /chat").await?;
        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat response: {}", e);
            NexusError::Http(e)
        })?;

        Ok(body.content)
    }

    async fn fetch_history(&self, token: &str) -> Result<Vec<ChatExchange>> {
        let url = self.endpoint(HISTORY_PATH)?;
        tracing::debug!("Fetching chat history");

        let response = Self::authorize(self.client.get(url), Some(token))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("History request failed: {}", e);
                NexusError::Http(e)
            })?;

        let response = Self::check_status(response, "GET /api/chat/history").await?;
        let body: HistoryResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse history response: {}", e);
            NexusError::Http(e)
        })?;

        tracing::debug!("Fetched {} exchanges", body.messages.len());
        Ok(body.messages)
    }
}

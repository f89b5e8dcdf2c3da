//! Backend client abstraction
//!
//! The controller talks to the CodeNexus backend through [`ChatBackend`],
//! which keeps it testable without a network. [`HttpChatClient`] is the
//! production implementation.

use crate::error::Result;
use crate::session::ChatExchange;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpChatClient;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub content: String,
    /// Conversation the message belongs to, so the backend can group it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Request for `content` in conversation `session_id`
    pub fn new(content: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            content: content.into(),
            session_id,
        }
    }
}

/// Successful body of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    pub content: String,
}

/// Body of `GET /api/chat/history`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<ChatExchange>,
}

/// Remote operations the chat controller depends on
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message and return the assistant's reply text
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status; the
    /// error's display text is what the user should see.
    async fn send_chat(&self, request: &ChatRequest, token: Option<&str>) -> Result<String>;

    /// Fetch every stored exchange for the signed-in user
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or an
    /// undecodable body.
    async fn fetch_history(&self, token: &str) -> Result<Vec<ChatExchange>>;
}

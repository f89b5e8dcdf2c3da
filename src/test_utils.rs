//! Test utilities for nexuschat
//!
//! Provides [`FakeBackend`], an in-process [`ChatBackend`] with scripted
//! replies and optional gates that hold a request until the test releases
//! it, plus small builders for history fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::client::{ChatBackend, ChatRequest};
use crate::error::Result;
use crate::session::ChatExchange;

/// Scripted backend for controller tests
///
/// Replies are consumed in order; `Err(text)` becomes an error whose
/// display is exactly `text`. Every request is recorded so tests can assert
/// on the body and the credential that was sent.
#[derive(Debug)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    history: Mutex<std::result::Result<Vec<ChatExchange>, String>>,
    chat_requests: Mutex<Vec<(ChatRequest, Option<String>)>>,
    history_tokens: Mutex<Vec<String>>,
    chat_gate: Option<Notify>,
    history_gate: Option<Notify>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Backend with no scripted replies and an empty history
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            history: Mutex::new(Ok(Vec::new())),
            chat_requests: Mutex::new(Vec::new()),
            history_tokens: Mutex::new(Vec::new()),
            chat_gate: None,
            history_gate: None,
        }
    }

    /// Hold every chat request until [`release`](Self::release) is called
    pub fn gated(mut self) -> Self {
        self.chat_gate = Some(Notify::new());
        self
    }

    /// Hold every history request until [`release_history`](Self::release_history)
    pub fn gated_history(mut self) -> Self {
        self.history_gate = Some(Notify::new());
        self
    }

    /// Let one held chat request proceed
    pub fn release(&self) {
        if let Some(gate) = &self.chat_gate {
            gate.notify_one();
        }
    }

    /// Let one held history request proceed
    pub fn release_history(&self) {
        if let Some(gate) = &self.history_gate {
            gate.notify_one();
        }
    }

    /// Queue the next chat reply
    pub fn push_reply(&self, reply: std::result::Result<String, String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Set what every history fetch returns
    pub fn set_history(&self, history: std::result::Result<Vec<ChatExchange>, String>) {
        *self.history.lock().unwrap() = history;
    }

    /// Chat requests received so far, with the token each carried
    pub fn chat_requests(&self) -> Vec<(ChatRequest, Option<String>)> {
        self.chat_requests.lock().unwrap().clone()
    }

    /// Tokens of the history requests received so far
    pub fn history_tokens(&self) -> Vec<String> {
        self.history_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn send_chat(&self, request: &ChatRequest, token: Option<&str>) -> Result<String> {
        self.chat_requests
            .lock()
            .unwrap()
            .push((request.clone(), token.map(str::to_string)));

        if let Some(gate) = &self.chat_gate {
            gate.notified().await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }

    async fn fetch_history(&self, token: &str) -> Result<Vec<ChatExchange>> {
        self.history_tokens.lock().unwrap().push(token.to_string());

        if let Some(gate) = &self.history_gate {
            gate.notified().await;
        }

        let history = self.history.lock().unwrap().clone();
        history.map_err(|message| anyhow::anyhow!("{}", message))
    }
}

/// Fixed reference instant for history fixtures
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Build an exchange `minutes` after [`base_time`]
pub fn exchange_at(
    id: &str,
    session_id: Option<&str>,
    user: &str,
    ai: &str,
    minutes: i64,
) -> ChatExchange {
    ChatExchange {
        id: id.to_string(),
        session_id: session_id.map(str::to_string),
        user_message: user.to_string(),
        ai_response: ai.to_string(),
        created_at: base_time() + Duration::minutes(minutes),
    }
}

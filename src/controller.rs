//! Chat interaction controller
//!
//! Owns the active conversation and the session list, and mediates between
//! them and the backend. All operations take `&self`; state lives behind a
//! lock that is never held across an `.await`, so a controller can be
//! cloned into several tasks (a REPL and a background history load, say)
//! and still enforce one in-flight chat request at a time.
//!
//! Every local mutation bumps an epoch counter. A history load remembers the
//! epoch it started at and discards its result if the user started, picked,
//! or sent anything in the meantime, so a slow history response never
//! clobbers a conversation the user is already having.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::auth::CredentialProvider;
use crate::client::{ChatBackend, ChatRequest};
use crate::error::{NexusError, Result};
use crate::session::{self, ChatMessage, ConversationSession, DEFAULT_TITLE_MAX_CHARS};

/// Message shown when a request is cancelled before the reply arrives
const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Why a send was refused without contacting the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The text was empty or whitespace only
    Empty,
    /// Another request is still in flight
    Pending,
}

/// Result of [`ChatController::send_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was sent and no state changed
    Rejected(RejectReason),
    /// The backend replied; the reply is in the transcript and session
    Delivered {
        /// Assistant reply text
        reply: String,
    },
    /// The request failed; an error notice was added to the transcript only
    Failed {
        /// Error text shown to the user (without the error prefix)
        error: String,
    },
    /// The cancellation token fired before the reply arrived
    Cancelled,
}

/// Result of [`ChatController::load_history`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryLoad {
    /// Sessions were rebuilt from the fetched history
    Loaded {
        /// Number of sessions after the rebuild
        sessions: usize,
    },
    /// No credential was available; history requires one
    Unauthenticated,
    /// The user changed the conversation while the fetch was running
    Stale,
    /// The fetch failed; state was left unchanged
    Failed(String),
}

/// Text shown for a failed send
///
/// Backend rejections carry the response body, which is shown as-is.
fn user_facing_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<NexusError>() {
        Some(NexusError::Authentication(message)) => message.clone(),
        _ => error.to_string(),
    }
}

/// Mutable state shared by every clone of a controller
#[derive(Debug, Clone, Default)]
struct ChatState {
    current_session_id: Option<String>,
    messages: Vec<ChatMessage>,
    sessions: Vec<ConversationSession>,
    pending: bool,
    last_error: Option<String>,
    epoch: u64,
}

/// Clears `pending` when dropped, including when the send future is
/// dropped before completing
struct PendingGuard {
    state: Arc<RwLock<ChatState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pending = false;
    }
}

/// Drives one user's chat UI
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use nexuschat::auth::StaticCredentialProvider;
/// use nexuschat::client::HttpChatClient;
/// use nexuschat::config::ApiConfig;
/// use nexuschat::controller::{ChatController, SendOutcome};
///
/// # async fn example() -> nexuschat::error::Result<()> {
/// let controller = ChatController::new(
///     Arc::new(HttpChatClient::new(&ApiConfig::default())?),
///     Arc::new(StaticCredentialProvider::anonymous()),
/// );
/// if let SendOutcome::Delivered { reply } = controller.send_message("Review my resume").await {
///     println!("{}", reply);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    credentials: Arc<dyn CredentialProvider>,
    state: Arc<RwLock<ChatState>>,
    title_max_chars: usize,
}

impl ChatController {
    /// Create a controller with an empty session list
    pub fn new(backend: Arc<dyn ChatBackend>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            backend,
            credentials,
            state: Arc::new(RwLock::new(ChatState::default())),
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }

    /// Override the maximum title length used for new sessions
    pub fn with_title_max_chars(mut self, title_max_chars: usize) -> Self {
        self.title_max_chars = title_max_chars;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, ChatState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChatState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Id of the active conversation, if any
    pub fn current_session_id(&self) -> Option<String> {
        self.read().current_session_id.clone()
    }

    /// The active conversation, if it is in the session list
    pub fn current_session(&self) -> Option<ConversationSession> {
        let state = self.read();
        let id = state.current_session_id.as_deref()?;
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Transcript of the active conversation, including local error notices
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.read().messages.clone()
    }

    /// All known sessions, most recently active first
    pub fn sessions(&self) -> Vec<ConversationSession> {
        self.read().sessions.clone()
    }

    /// Whether a chat request is in flight
    pub fn is_pending(&self) -> bool {
        self.read().pending
    }

    /// Text of the most recent send failure, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    /// Leave the current conversation; the next send starts a new one
    pub fn start_new_conversation(&self) {
        let mut state = self.write();
        state.current_session_id = None;
        state.messages.clear();
        state.epoch += 1;
        tracing::debug!("Started new conversation");
    }

    /// Make `session_id` the active conversation
    ///
    /// Returns `false` and changes nothing when no session has that id.
    pub fn select_session(&self, session_id: &str) -> bool {
        let mut state = self.write();
        let Some(messages) = state
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| s.messages.clone())
        else {
            tracing::debug!(session_id, "Ignoring selection of unknown session");
            return false;
        };

        state.current_session_id = Some(session_id.to_string());
        state.messages = messages;
        state.epoch += 1;
        true
    }

    /// Resolve a full session id from an exact id or a unique prefix
    pub fn find_session_id(&self, id_or_prefix: &str) -> Option<String> {
        let state = self.read();
        if let Some(session) = state.sessions.iter().find(|s| s.id == id_or_prefix) {
            return Some(session.id.clone());
        }
        let mut matches = state
            .sessions
            .iter()
            .filter(|s| s.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(only), None) if !id_or_prefix.is_empty() => Some(only.id.clone()),
            _ => None,
        }
    }

    /// Sessions whose title contains `query`, ignoring case
    pub fn filter_sessions(&self, query: &str) -> Vec<ConversationSession> {
        session::filter_sessions(&self.read().sessions, query)
    }

    /// Send `text` to the assistant
    ///
    /// The user's message appears in the transcript before the request is
    /// made. Failures never propagate: they become an error notice in the
    /// transcript and set [`last_error`](Self::last_error).
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        self.send(text, None).await
    }

    /// Like [`send_message`](Self::send_message), but gives up when `cancel`
    /// fires
    pub async fn send_message_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> SendOutcome {
        self.send(text, Some(cancel)).await
    }

    async fn send(&self, text: &str, cancel: Option<&CancellationToken>) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Rejected(RejectReason::Empty);
        }

        let session_id = {
            let mut state = self.write();
            if state.pending {
                tracing::debug!("Rejecting send while a request is in flight");
                return SendOutcome::Rejected(RejectReason::Pending);
            }

            let session_id = match state.current_session_id.clone() {
                Some(id) => id,
                None => {
                    let session =
                        ConversationSession::new_local(text, self.title_max_chars, Utc::now());
                    let id = session.id.clone();
                    tracing::info!(session_id = %id, "Starting new conversation");
                    state.sessions.insert(0, session);
                    state.current_session_id = Some(id.clone());
                    id
                }
            };

            state.messages.push(ChatMessage::user(text));
            state.pending = true;
            state.epoch += 1;
            session_id
        };
        let _pending = PendingGuard {
            state: Arc::clone(&self.state),
        };

        let request = ChatRequest::new(text, Some(session_id.clone()));
        let call = self.dispatch(&request);
        let result = match cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => None,
                result = call => Some(result),
            },
            None => Some(call.await),
        };

        let mut state = self.write();
        // A history fetch that overlapped this request predates its outcome
        state.epoch += 1;
        let still_current = state.current_session_id.as_deref() == Some(session_id.as_str());
        match result {
            Some(Ok(reply)) => {
                if still_current {
                    state.messages.push(ChatMessage::assistant(reply.as_str()));
                }
                match state.sessions.iter_mut().find(|s| s.id == session_id) {
                    Some(session) => session.record_exchange(text, &reply, Utc::now()),
                    None => tracing::debug!(session_id = %session_id, "Session vanished before reply"),
                }
                state.sessions.sort_by(|a, b| b.end_time.cmp(&a.end_time));
                state.last_error = None;
                SendOutcome::Delivered { reply }
            }
            Some(Err(e)) => {
                let error = user_facing_error(&e);
                tracing::warn!(session_id = %session_id, "Chat request failed: {}", error);
                if still_current {
                    state.messages.push(ChatMessage::error(&error));
                }
                state.last_error = Some(error.clone());
                SendOutcome::Failed { error }
            }
            None => {
                tracing::info!(session_id = %session_id, "Chat request cancelled");
                if still_current {
                    state.messages.push(ChatMessage::error(CANCELLED_MESSAGE));
                }
                state.last_error = Some(CANCELLED_MESSAGE.to_string());
                SendOutcome::Cancelled
            }
        }
    }

    /// Look up a credential (optional for chat) and call the backend
    async fn dispatch(&self, request: &ChatRequest) -> Result<String> {
        let token = match self.credentials.get_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Credential lookup failed, sending without one: {}", e);
                None
            }
        };
        self.backend.send_chat(request, token.as_deref()).await
    }

    /// Fetch history and rebuild the session list from scratch
    ///
    /// The current conversation pointer and transcript are left alone. The
    /// result is discarded as [`HistoryLoad::Stale`] if any local change
    /// happened while the fetch was running, or a send is still in flight.
    pub async fn load_history(&self) -> HistoryLoad {
        let started_at = self.read().epoch;

        let token = match self.credentials.get_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("Not signed in; skipping history load");
                return HistoryLoad::Unauthenticated;
            }
            Err(e) => {
                tracing::warn!("Credential lookup failed; skipping history load: {}", e);
                return HistoryLoad::Unauthenticated;
            }
        };

        let exchanges = match self.backend.fetch_history(&token).await {
            Ok(exchanges) => exchanges,
            Err(e) => {
                tracing::warn!("Failed to load chat history: {}", e);
                return HistoryLoad::Failed(e.to_string());
            }
        };
        let sessions = session::build_sessions(&exchanges, self.title_max_chars);

        let mut state = self.write();
        if state.epoch != started_at || state.pending {
            tracing::debug!("Discarding stale history response");
            return HistoryLoad::Stale;
        }
        let count = sessions.len();
        state.sessions = sessions;
        tracing::info!("Loaded {} conversations from history", count);
        HistoryLoad::Loaded { sessions: count }
    }
}

//! Conversation session reconstruction
//!
//! The history endpoint returns a flat list of exchanges. This module folds
//! that list into conversations, one per grouping key, ordered so the most
//! recently active conversation comes first. Everything here is pure; the
//! session set is rebuilt from scratch on every history load.

use std::collections::HashMap;

pub mod types;
pub use types::{ChatExchange, ChatMessage, ConversationSession, ERROR_PREFIX};

/// Default maximum number of characters kept in a session title
pub const DEFAULT_TITLE_MAX_CHARS: usize = 50;

/// Marker appended to truncated titles
const ELLIPSIS: &str = "...";

/// Truncate `text` to `max_chars` characters, appending `...` when cut
///
/// Counts Unicode scalar values rather than bytes so multi-byte text is
/// never split mid-character.
///
/// # Examples
///
/// ```
/// use nexuschat::session::truncate_title;
///
/// assert_eq!(truncate_title("short", 50), "short");
/// assert_eq!(truncate_title("abcdef", 3), "abc...");
/// ```
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Group exchanges into conversations, most recently active first
///
/// Each exchange is visited once in input order. Within a session the
/// transcript keeps that order; sessions whose `end_time` ties keep the
/// order in which they were first seen.
///
/// # Examples
///
/// ```
/// use nexuschat::session::{build_sessions, ChatExchange};
///
/// assert!(build_sessions(&[], 50).is_empty());
/// ```
pub fn build_sessions(exchanges: &[ChatExchange], title_max_chars: usize) -> Vec<ConversationSession> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sessions: Vec<ConversationSession> = Vec::new();

    for exchange in exchanges {
        let key = exchange.grouping_key();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                sessions.push(ConversationSession {
                    id: key.clone(),
                    title: truncate_title(&exchange.user_message, title_max_chars),
                    start_time: exchange.created_at,
                    end_time: exchange.created_at,
                    message_count: 0,
                    messages: Vec::new(),
                });
                index.insert(key, sessions.len() - 1);
                sessions.len() - 1
            }
        };

        let session = &mut sessions[slot];
        if exchange.created_at < session.start_time {
            session.start_time = exchange.created_at;
        }
        session.record_exchange(
            &exchange.user_message,
            &exchange.ai_response,
            exchange.created_at,
        );
    }

    tracing::debug!(
        "Rebuilt {} sessions from {} exchanges",
        sessions.len(),
        exchanges.len()
    );

    sessions.sort_by(|a, b| b.end_time.cmp(&a.end_time));
    sessions
}

/// Sessions whose title contains `query`, ignoring case
///
/// Order is preserved. An empty query matches everything.
pub fn filter_sessions(sessions: &[ConversationSession], query: &str) -> Vec<ConversationSession> {
    let needle = query.to_lowercase();
    sessions
        .iter()
        .filter(|s| s.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

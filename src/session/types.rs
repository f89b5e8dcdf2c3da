use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix shown on locally synthesized assistant messages that report a failure
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// One stored user message and the assistant reply it produced
///
/// Received from the history endpoint and never modified afterwards. The
/// backend emits integer ids and may omit the session id for exchanges that
/// were recorded before sessions existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    /// Unique identifier of the exchange
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Grouping key shared by all exchanges of one conversation
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
    /// Text the user sent
    #[serde(alias = "user_message")]
    pub user_message: String,
    /// Text the assistant returned
    #[serde(alias = "ai_response")]
    pub ai_response: String,
    /// When the exchange happened; malformed values decode to the Unix epoch
    #[serde(
        default,
        alias = "created_at",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl ChatExchange {
    /// Key used to group this exchange into a conversation
    ///
    /// Exchanges without a session id (or with an empty one) become their
    /// own conversation, keyed by their exchange id.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexuschat::session::ChatExchange;
    ///
    /// let exchange = ChatExchange {
    ///     id: "7".to_string(),
    ///     session_id: None,
    ///     user_message: "hi".to_string(),
    ///     ai_response: "hello".to_string(),
    ///     created_at: Default::default(),
    /// };
    /// assert_eq!(exchange.grouping_key(), "exchange-7");
    /// ```
    pub fn grouping_key(&self) -> String {
        match self.session_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => format!("exchange-{}", self.id),
        }
    }
}

/// A single chat turn as shown in a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message text
    pub content: String,
    /// `true` for assistant replies (including local error notices)
    pub is_from_assistant: bool,
}

impl ChatMessage {
    /// Create a message authored by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_from_assistant: false,
        }
    }

    /// Create a message authored by the assistant
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_from_assistant: true,
        }
    }

    /// Create a local assistant-style notice describing a failure
    ///
    /// # Examples
    ///
    /// ```
    /// use nexuschat::session::ChatMessage;
    ///
    /// let msg = ChatMessage::error("Server error");
    /// assert!(msg.is_error());
    /// assert_eq!(msg.content, "❌ Error: Server error");
    /// ```
    pub fn error(message: impl AsRef<str>) -> Self {
        Self::assistant(format!("{}{}", ERROR_PREFIX, message.as_ref()))
    }

    /// Whether this message is a locally synthesized error notice
    pub fn is_error(&self) -> bool {
        self.is_from_assistant && self.content.starts_with(ERROR_PREFIX)
    }
}

/// A conversation derived from one or more exchanges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    /// Grouping key (server session id, or a local ULID for new conversations)
    pub id: String,
    /// First user message, truncated for display
    pub title: String,
    /// Earliest exchange timestamp
    pub start_time: DateTime<Utc>,
    /// Latest exchange timestamp
    pub end_time: DateTime<Utc>,
    /// Number of chat turns (two per exchange)
    pub message_count: usize,
    /// Transcript, user message followed by its reply
    pub messages: Vec<ChatMessage>,
}

impl ConversationSession {
    /// Start an empty locally created conversation
    ///
    /// The identifier is a ULID, so it embeds `now` and stays unique even
    /// when two conversations start within the same millisecond.
    pub fn new_local(first_message: &str, title_max_chars: usize, now: DateTime<Utc>) -> Self {
        let id = ulid::Ulid::from_datetime(now.into()).to_string();
        Self {
            id,
            title: super::truncate_title(first_message, title_max_chars),
            start_time: now,
            end_time: now,
            message_count: 0,
            messages: Vec::new(),
        }
    }

    /// Append one user message and its reply
    ///
    /// `end_time` only ever moves forward.
    pub fn record_exchange(&mut self, user: &str, reply: &str, at: DateTime<Utc>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(reply));
        self.message_count += 2;
        if at > self.end_time {
            self.end_time = at;
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "exchange id must be a string or number, got {}",
            other
        ))),
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        tracing::debug!("Unparseable exchange timestamp, treating as epoch");
        DateTime::<Utc>::default()
    }))
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exchange_deserializes_camel_case_with_string_id() {
        let exchange: ChatExchange = serde_json::from_value(json!({
            "id": "abc",
            "sessionId": "s1",
            "userMessage": "hi",
            "aiResponse": "hello",
            "createdAt": "2025-04-09T22:06:31Z"
        }))
        .unwrap();
        assert_eq!(exchange.id, "abc");
        assert_eq!(exchange.session_id.as_deref(), Some("s1"));
        assert_eq!(exchange.created_at.to_rfc3339(), "2025-04-09T22:06:31+00:00");
    }

    #[test]
    fn test_exchange_deserializes_backend_snake_case_with_numeric_id() {
        let exchange: ChatExchange = serde_json::from_value(json!({
            "id": 42,
            "session_id": null,
            "user_message": "hi",
            "ai_response": "hello",
            "created_at": "2025-04-09T22:06:31.123456"
        }))
        .unwrap();
        assert_eq!(exchange.id, "42");
        assert_eq!(exchange.session_id, None);
        assert_eq!(exchange.grouping_key(), "exchange-42");
        assert_eq!(exchange.created_at.timestamp(), 1744236391);
    }

    #[test]
    fn test_malformed_timestamp_decodes_to_epoch() {
        let exchange: ChatExchange = serde_json::from_value(json!({
            "id": 1,
            "userMessage": "a",
            "aiResponse": "b",
            "createdAt": "yesterday-ish"
        }))
        .unwrap();
        assert_eq!(exchange.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_missing_timestamp_decodes_to_epoch() {
        let exchange: ChatExchange = serde_json::from_value(json!({
            "id": 1,
            "userMessage": "a",
            "aiResponse": "b"
        }))
        .unwrap();
        assert_eq!(exchange.created_at.timestamp(), 0);
    }

    #[test]
    fn test_boolean_id_is_rejected() {
        let result = serde_json::from_value::<ChatExchange>(json!({
            "id": true,
            "userMessage": "a",
            "aiResponse": "b"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_session_id_falls_back_to_exchange_key() {
        let exchange = ChatExchange {
            id: "9".to_string(),
            session_id: Some("  ".to_string()),
            user_message: String::new(),
            ai_response: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(exchange.grouping_key(), "exchange-9");
    }

    #[test]
    fn test_chat_message_serializes_is_from_assistant() {
        let value = serde_json::to_value(ChatMessage::assistant("ok")).unwrap();
        assert_eq!(value, json!({"content": "ok", "isFromAssistant": true}));
    }

    #[test]
    fn test_user_message_with_error_prefix_is_not_an_error() {
        let msg = ChatMessage::user(format!("{}oops", ERROR_PREFIX));
        assert!(!msg.is_error());
    }

    #[test]
    fn test_record_exchange_never_moves_end_time_backwards() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let mut session = ConversationSession::new_local("hello", 50, t0);
        session.record_exchange("a", "b", t0 - chrono::Duration::hours(1));
        assert_eq!(session.end_time, t0);
        session.record_exchange("c", "d", t0 + chrono::Duration::hours(1));
        assert_eq!(session.end_time, t0 + chrono::Duration::hours(1));
        assert_eq!(session.message_count, 4);
        assert_eq!(session.messages.len(), 4);
    }

    #[test]
    fn test_new_local_sessions_have_distinct_ids() {
        let now = Utc::now();
        let a = ConversationSession::new_local("x", 50, now);
        let b = ConversationSession::new_local("x", 50, now);
        assert_ne!(a.id, b.id);
        assert_eq!(a.start_time, a.end_time);
    }
}

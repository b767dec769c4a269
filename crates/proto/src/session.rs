use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a new random session identifier (used by fixtures; real ids
    /// are issued by the server).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the raw session identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Author of one conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the end user.
    User,
    /// Message produced by the remote assistant.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(crate::error::ProtoError::InvalidRole(other.to_string())),
        }
    }
}

/// One turn in a session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Semantic role of this message.
    pub role: Role,
    /// Message content payload.
    pub content: String,
    /// Creation timestamp in UTC. Client-assigned for user messages,
    /// server-assigned for assistant replies.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Sidebar entry for a session: identity and metadata without messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Server-issued session id.
    pub id: SessionId,
    /// Display title. Server-assigned; may change after a send (the server
    /// derives it from the first message).
    pub title: String,
    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A fully loaded session including its ordered message sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Server-issued session id.
    pub id: SessionId,
    /// Display title.
    pub title: String,
    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
    /// Ordered message sequence (send order). Absent in list responses.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Projects the metadata view of this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::ProtoError;

    #[test]
    fn session_id_new_creates_non_empty_value() {
        let session = SessionId::new();
        assert!(!session.as_str().is_empty());
    }

    #[test]
    fn role_display_and_parse_round_trip() {
        for role in [Role::User, Role::Assistant] {
            let rendered = role.to_string();
            let parsed = Role::from_str(&rendered).expect("role should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_parse_invalid_value_returns_error() {
        let err = Role::from_str("system").expect_err("invalid role should fail");
        match err {
            ProtoError::InvalidRole(value) => assert_eq!(value, "system"),
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn message_constructors_set_role_and_content() {
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let assistant = Message::assistant("hi there");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "hi there");
    }

    #[test]
    fn message_serializes_role_lowercase() {
        let msg = Message::user("hello");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn session_deserializes_without_messages() {
        // List responses omit the messages field entirely.
        let json = serde_json::json!({
            "id": "abc",
            "title": "New Chat",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let session: Session = serde_json::from_value(json).expect("deserialize");
        assert_eq!(session.id.as_str(), "abc");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn session_summary_projection_preserves_identity() {
        let json = serde_json::json!({
            "id": "s1",
            "title": "Knee pain",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "messages": [
                {"role": "user", "content": "hi", "timestamp": "2024-01-01T00:00:00Z"}
            ]
        });
        let session: Session = serde_json::from_value(json).expect("deserialize");
        let summary = session.summary();
        assert_eq!(summary.id, session.id);
        assert_eq!(summary.title, "Knee pain");
        assert_eq!(summary.updated_at, session.updated_at);
    }
}

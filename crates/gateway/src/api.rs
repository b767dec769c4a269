//! Gateway operation contract shared by the HTTP implementation and test
//! doubles.

use async_trait::async_trait;
use proto::{ApiError, Message, Session, SessionId, SessionSummary};

/// Explicitly threaded request credential context.
///
/// Replaces the original ambient token storage: the gateway receives this
/// value at construction rather than reading process-wide state. An absent
/// token means requests go out unauthenticated and the server is expected
/// to reject them with 401.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// Bearer credential attached to every request when present.
    pub token: Option<String>,
    /// Identity of the signed-in user, for log correlation only.
    pub current_user_id: Option<String>,
}

impl AuthContext {
    /// Creates a context carrying a bearer token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            current_user_id: None,
        }
    }

    /// Creates an unauthenticated context.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Connection settings for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the remote service.
    pub api_base_url: String,
    /// Optional client-side timeout for `send_message`, in milliseconds.
    ///
    /// The assistant reply is computed remotely and can take arbitrarily
    /// long, so there is no timeout by default; setting one bounds how long
    /// the send protocol stays busy on a hung request.
    pub timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            timeout_ms: None,
        }
    }
}

/// The five remote operations the chat core depends on.
///
/// One request/response pair each, no retries built in. Implementations
/// must propagate failures as typed [`ApiError`] values and leave no side
/// effects on failure.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Creates a new empty session owned by the current user.
    async fn create_session(&self) -> Result<Session, ApiError>;

    /// Lists session summaries in server-defined (authoritative) order.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError>;

    /// Fetches one session with its full message sequence.
    async fn fetch_session(&self, id: &SessionId) -> Result<Session, ApiError>;

    /// Deletes a session. Repeated deletion of an already-deleted id yields
    /// [`ApiError::NotFound`]; callers treat that as success.
    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError>;

    /// Sends user content to a session and returns the assistant's reply.
    async fn send_message(&self, id: &SessionId, content: &str) -> Result<Message, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_local_endpoint() {
        let config = GatewayConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert!(config.timeout_ms.is_none());
    }

    #[test]
    fn auth_context_constructors() {
        let auth = AuthContext::with_token("tok-123");
        assert_eq!(auth.token.as_deref(), Some("tok-123"));
        assert!(auth.current_user_id.is_none());

        let anon = AuthContext::anonymous();
        assert!(anon.token.is_none());
    }
}

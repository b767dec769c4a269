//! HTTP+JSON implementation of the session gateway.

use std::time::Duration;

use async_trait::async_trait;
use proto::{ApiError, Message, Session, SessionId, SessionSummary};
use serde::Serialize;
use tracing::debug;

use crate::api::{AuthContext, GatewayConfig, SessionGateway};

/// reqwest-backed gateway speaking the remote service's REST contract.
pub struct HttpGateway {
    base_url: String,
    http: reqwest::Client,
    auth: AuthContext,
    send_timeout: Option<Duration>,
}

/// POST /api/chats/{id}/messages request body.
#[derive(Serialize)]
struct SendMessageBody<'a> {
    content: &'a str,
}

impl HttpGateway {
    /// Creates a gateway from connection settings and a credential context.
    pub fn new(config: GatewayConfig, auth: AuthContext) -> Self {
        debug!(
            base_url = %config.api_base_url,
            user = ?auth.current_user_id,
            "HTTP gateway created"
        );
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            auth,
            send_timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attaches the bearer credential when one is present.
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends a prepared request and maps the outcome to a typed result.
    async fn execute(
        &self,
        req: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), target, &body))
    }
}

#[async_trait]
impl SessionGateway for HttpGateway {
    async fn create_session(&self) -> Result<Session, ApiError> {
        let resp = self
            .execute(self.http.post(self.url("/api/chats")), "session")
            .await?;
        decode_body(resp).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        let resp = self
            .execute(self.http.get(self.url("/api/chats")), "sessions")
            .await?;
        decode_body(resp).await
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<Session, ApiError> {
        let url = self.url(&format!("/api/chats/{id}"));
        let resp = self.execute(self.http.get(url), id.as_str()).await?;
        decode_body(resp).await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/chats/{id}"));
        // Ack body ({"message": ...}) is not interesting to callers.
        self.execute(self.http.delete(url), id.as_str()).await?;
        Ok(())
    }

    async fn send_message(&self, id: &SessionId, content: &str) -> Result<Message, ApiError> {
        let url = self.url(&format!("/api/chats/{id}/messages"));
        let mut req = self.http.post(url).json(&SendMessageBody { content });
        if let Some(timeout) = self.send_timeout {
            req = req.timeout(timeout);
        }
        let resp = self.execute(req, id.as_str()).await?;
        decode_body(resp).await
    }
}

/// Maps a non-2xx status to the error taxonomy.
///
/// `target` names what the request addressed (a session id, usually) so
/// that `NotFound` errors are self-describing.
fn classify_failure(status: u16, target: &str, body: &str) -> ApiError {
    match status {
        401 => ApiError::Unauthorized(extract_detail(body)),
        404 => ApiError::NotFound(target.to_string()),
        400 | 422 => ApiError::Validation(extract_detail(body)),
        _ => ApiError::Server {
            status,
            detail: extract_detail(body),
        },
    }
}

/// Pulls the human-readable `detail` field out of a FastAPI-style error
/// body, falling back to the raw body text.
fn extract_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    match parsed.as_ref().and_then(|v| v.get("detail")) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

/// Decodes a 2xx JSON body, reporting malformed payloads as network-level
/// failures (the response never usably arrived).
async fn decode_body<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Network(format!("malformed response body: {e}")))
}

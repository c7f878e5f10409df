use std::time::Duration;

use tracing::warn;

use loupe_api::{
    DailyUsage, MessageBreakdown, MessageSearchResponse, SessionDetail, SessionSearchResponse,
    SessionSummary,
};
use loupe_core::message::Message;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Typed HTTP client for the loupe session server.
///
/// One method per endpoint; all of them are plain GETs against the `/api`
/// prefix. Failures are returned to the caller, which degrades to an empty
/// state — the client itself never retries.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let resp = self.client.get(&url).send().await?;
        parse_response(resp).await
    }

    // ── Sessions ──────────────────────────────────────────────────────────

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        self.get("/sessions").await
    }

    pub async fn search_sessions(&self, query: &str) -> Result<SessionSearchResponse, ClientError> {
        self.get(&format!("/sessions/search?q={}", urlencoding::encode(query)))
            .await
    }

    pub async fn get_session(&self, id: &str) -> Result<SessionDetail, ClientError> {
        self.get(&format!("/sessions/{id}")).await
    }

    // ── Messages ──────────────────────────────────────────────────────────

    pub async fn list_messages(&self, id: &str) -> Result<Vec<Message>, ClientError> {
        self.get(&format!("/sessions/{id}/messages")).await
    }

    pub async fn search_messages(
        &self,
        id: &str,
        query: &str,
    ) -> Result<MessageSearchResponse, ClientError> {
        self.get(&format!(
            "/sessions/{id}/messages/search?q={}",
            urlencoding::encode(query)
        ))
        .await
    }

    /// Raw payload of a single message, as stored in the original log.
    pub async fn get_message(
        &self,
        id: &str,
        index: usize,
    ) -> Result<serde_json::Value, ClientError> {
        self.get(&format!("/messages/{id}/{index}")).await
    }

    pub async fn message_breakdown(&self, id: &str) -> Result<MessageBreakdown, ClientError> {
        self.get(&format!("/sessions/{id}/message_breakdown")).await
    }

    // ── Usage ─────────────────────────────────────────────────────────────

    pub async fn daily_usage(&self) -> Result<DailyUsage, ClientError> {
        self.get("/usage/daily").await
    }
}

/// Parse an HTTP response: deserialize the body on 2xx, otherwise surface
/// the status and body text.
async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, "request failed");
        return Err(ClientError::Status { status, body });
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/sessions"), "http://localhost:8000/api/sessions");
    }

    #[test]
    fn search_queries_are_percent_encoded() {
        let encoded = urlencoding::encode("fix the bug & ship");
        assert_eq!(encoded, "fix%20the%20bug%20%26%20ship");
    }
}

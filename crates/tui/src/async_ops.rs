use std::time::Duration;

use tracing::warn;

use loupe_api::{
    DailyUsage, MessageBreakdown, MessageSearchResponse, SessionDetail, SessionSearchResponse,
    SessionSummary,
};
use loupe_api_client::ApiClient;
use loupe_core::message::Message;

use crate::config::ClientConfig;

/// Commands that require async I/O (network calls).
///
/// Supersedable commands carry a generation number; the app discards any
/// result whose generation is no longer current, so a stale response can
/// never overwrite newer state.
pub enum AsyncCommand {
    FetchSessions,
    SearchSessions {
        query: String,
        generation: u64,
    },
    LoadSession {
        session_id: String,
        generation: u64,
    },
    SearchMessages {
        session_id: String,
        query: String,
        generation: u64,
    },
    FetchRawMessage {
        session_id: String,
        index: usize,
        generation: u64,
    },
    FetchDailyUsage,
}

/// Everything the detail view needs, fetched concurrently and joined.
pub struct SessionPayload {
    pub session_id: String,
    pub detail: Option<SessionDetail>,
    pub messages: Vec<Message>,
    pub breakdown: MessageBreakdown,
}

/// Results returned by async commands.
pub enum CommandResult {
    Sessions(Result<Vec<SessionSummary>, String>),
    SessionSearch {
        generation: u64,
        result: Result<SessionSearchResponse, String>,
    },
    SessionLoaded {
        generation: u64,
        result: Result<SessionPayload, String>,
    },
    MessageSearch {
        generation: u64,
        result: Result<MessageSearchResponse, String>,
    },
    RawMessage {
        generation: u64,
        result: Result<serde_json::Value, String>,
    },
    DailyUsage(Result<DailyUsage, String>),
}

fn make_client(config: &ClientConfig) -> Result<ApiClient, String> {
    ApiClient::new(
        &config.server.url,
        Duration::from_secs(config.server.timeout_secs),
    )
    .map_err(|e| format!("Failed to create HTTP client: {e}"))
}

pub async fn execute(cmd: AsyncCommand, config: &ClientConfig) -> CommandResult {
    match cmd {
        AsyncCommand::FetchSessions => {
            let result = async {
                let client = make_client(config)?;
                client.list_sessions().await.map_err(|e| format!("{e}"))
            }
            .await;
            CommandResult::Sessions(result)
        }

        AsyncCommand::SearchSessions { query, generation } => {
            let result = async {
                let client = make_client(config)?;
                client
                    .search_sessions(&query)
                    .await
                    .map_err(|e| format!("{e}"))
            }
            .await;
            CommandResult::SessionSearch { generation, result }
        }

        AsyncCommand::LoadSession {
            session_id,
            generation,
        } => {
            let result = async {
                let client = make_client(config)?;
                // Independent fetches, issued concurrently and joined before
                // any derived computation starts.
                let (detail, messages, breakdown) = tokio::join!(
                    client.get_session(&session_id),
                    client.list_messages(&session_id),
                    client.message_breakdown(&session_id),
                );
                // The message list is the backbone; the side fetches degrade
                // to empty on failure.
                let messages = messages.map_err(|e| format!("{e}"))?;
                let detail = detail
                    .inspect_err(|e| warn!(%session_id, "session detail fetch failed: {e}"))
                    .ok();
                let breakdown = breakdown
                    .inspect_err(|e| warn!(%session_id, "breakdown fetch failed: {e}"))
                    .unwrap_or_default();
                Ok(SessionPayload {
                    session_id,
                    detail,
                    messages,
                    breakdown,
                })
            }
            .await;
            CommandResult::SessionLoaded { generation, result }
        }

        AsyncCommand::SearchMessages {
            session_id,
            query,
            generation,
        } => {
            let result = async {
                let client = make_client(config)?;
                client
                    .search_messages(&session_id, &query)
                    .await
                    .map_err(|e| format!("{e}"))
            }
            .await;
            CommandResult::MessageSearch { generation, result }
        }

        AsyncCommand::FetchRawMessage {
            session_id,
            index,
            generation,
        } => {
            let result = async {
                let client = make_client(config)?;
                client
                    .get_message(&session_id, index)
                    .await
                    .map_err(|e| format!("{e}"))
            }
            .await;
            CommandResult::RawMessage { generation, result }
        }

        AsyncCommand::FetchDailyUsage => {
            let result = async {
                let client = make_client(config)?;
                client.daily_usage().await.map_err(|e| format!("{e}"))
            }
            .await;
            CommandResult::DailyUsage(result)
        }
    }
}

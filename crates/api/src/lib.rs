//! Request/response types for the loupe session server API.
//!
//! These mirror the server's JSON contract exactly; the client and TUI
//! treat every endpoint as an opaque collaborator and only depend on the
//! shapes defined here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loupe_core::message::LocDelta;
use loupe_core::summary::SessionFacts;

/// One row of the session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub commit_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_loc: Option<LocDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_loc: Option<LocDelta>,
}

/// Session-level rollups served by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_time_seconds: Option<f64>,
    /// Seconds spent per tool name.
    #[serde(default)]
    pub tool_time_breakdown: HashMap<String, f64>,
    #[serde(default)]
    pub error_count: u64,
}

impl SessionDetail {
    /// Session-level fields in the shape the summary engine consumes.
    pub fn facts(&self) -> SessionFacts {
        SessionFacts {
            duration_seconds: self.duration_seconds,
            agent_time_seconds: self.agent_time_seconds,
            tool_time_seconds: self.tool_time_seconds,
            error_count: self.error_count,
        }
    }
}

/// Response of the cross-session search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSearchResponse {
    pub query: String,
    #[serde(default)]
    pub matching_session_ids: Vec<String>,
}

/// Response of the in-session message search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSearchResponse {
    pub query: String,
    #[serde(default)]
    pub matching_indices: Vec<usize>,
}

/// One row of the message-type breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub category: String,
    pub count: u64,
    /// Coarse role bucket the category belongs to (tool/assistant/user).
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageBreakdown {
    #[serde(default)]
    pub breakdown: Vec<BreakdownEntry>,
    #[serde(default)]
    pub total: u64,
}

/// Cumulative daily totals for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsagePoint {
    pub weekday: String,
    pub cumulative_total: u64,
}

/// Current vs previous week usage curves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyUsage {
    #[serde(default)]
    pub current_week: Vec<DailyUsagePoint>,
    #[serde(default)]
    pub previous_week: Vec<DailyUsagePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_summary_deserializes_server_payload() {
        let json = r#"{
            "session_id": "abc",
            "project_name": "loupe",
            "project_path": "/home/u/loupe",
            "start_time": "2025-06-01T10:00:00Z",
            "end_time": "2025-06-01T11:00:00Z",
            "duration_seconds": 3600.0,
            "agent_time_seconds": 1200.5,
            "tool_time_seconds": 300.25,
            "input_tokens": 1000,
            "output_tokens": 2000,
            "commit_count": 3,
            "error_count": 1,
            "tool_loc": {"added": 120, "removed": 40},
            "git_loc": null
        }"#;
        let summary: SessionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.session_id, "abc");
        assert_eq!(summary.commit_count, 3);
        assert_eq!(summary.tool_loc.unwrap().added, 120);
        assert!(summary.git_loc.is_none());
    }

    #[test]
    fn session_detail_converts_to_facts() {
        let json = r#"{
            "session_id": "abc",
            "duration_seconds": 60.0,
            "agent_time_seconds": 20.0,
            "tool_time_seconds": 5.0,
            "tool_time_breakdown": {"Bash": 3.5, "Read": 1.5},
            "error_count": 2
        }"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();
        let facts = detail.facts();
        assert_eq!(facts.duration_seconds, Some(60.0));
        assert_eq!(facts.error_count, 2);
        assert_eq!(detail.tool_time_breakdown["Bash"], 3.5);
    }

    #[test]
    fn breakdown_entry_uses_type_on_the_wire() {
        let json = r#"{"breakdown": [{"category": "Bash", "count": 4, "type": "tool"}], "total": 4}"#;
        let breakdown: MessageBreakdown = serde_json::from_str(json).unwrap();
        assert_eq!(breakdown.breakdown[0].kind, "tool");
        assert_eq!(breakdown.total, 4);
    }

    #[test]
    fn daily_usage_defaults_to_empty_weeks() {
        let usage: DailyUsage = serde_json::from_str("{}").unwrap();
        assert!(usage.current_week.is_empty());
        assert!(usage.previous_week.is_empty());
    }
}

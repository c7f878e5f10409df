use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a raw log message.
///
/// Anything that is neither `user` nor `assistant` (system markers, summary
/// lines) maps to `Other` and is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// Added/removed line counts attributed to one change source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocDelta {
    pub added: u64,
    pub removed: u64,
}

/// Line counts of the old/new text of an Edit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSummary {
    pub old_lines: u64,
    pub new_lines: u64,
}

/// One tool invocation emitted by an assistant message.
///
/// `id` is unique within its message; the matching [`ToolResult`] references
/// it by `tool_use_id`. The name-specific fields are whatever subset the
/// server extracted from the tool input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_summary: Option<EditSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_lines: Option<u64>,
}

/// Outcome of a tool invocation, carried by a later user-role message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    #[serde(default)]
    pub is_error: bool,
    /// Truncated result text; the full payload stays server-side.
    #[serde(default, alias = "preview", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One message of a session transcript, in canonical (== chronological) order.
///
/// Every field except `index` and `kind` is optional on the wire; absent
/// numerics contribute zero to rollups and an absent timestamp excludes the
/// message from timeline extraction only, never from turn assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub text_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default)]
    pub tool_uses: Vec<ToolUse>,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub is_commit: bool,
    /// Opaque commit metadata; rendered as-is, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_loc: Option<LocDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_loc: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_diff_loc: Option<LocDelta>,
    /// One-line preview the server precomputed for list rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default)]
    pub is_rejection: bool,
    #[serde(default)]
    pub is_tool_error: bool,
    #[serde(default)]
    pub is_command_failure: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_deserializes_from_minimal_wire_payload() {
        let json = r#"{"index": 3, "type": "user"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.index, 3);
        assert_eq!(msg.kind, Role::User);
        assert!(msg.timestamp.is_none());
        assert!(msg.text_content.is_empty());
        assert!(msg.tool_uses.is_empty());
        assert!(msg.tool_results.is_empty());
        assert!(!msg.is_commit);
    }

    #[test]
    fn unknown_role_maps_to_other() {
        let json = r#"{"index": 0, "type": "system"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, Role::Other);
    }

    #[test]
    fn tool_result_accepts_preview_alias() {
        let json = r#"{"tool_use_id": "a", "is_error": false, "preview": "ok"}"#;
        let result: ToolResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.content.as_deref(), Some("ok"));
    }

    #[test]
    fn message_roundtrip_preserves_tool_fields() {
        let mut msg = crate::testing::assistant(7, "running it", 0);
        let mut tool = crate::testing::tool_use("t1", "Bash");
        tool.command = Some("cargo test".to_string());
        msg.tool_uses.push(tool);
        msg.duration_seconds = Some(1.5);
        msg.input_tokens = Some(10);
        msg.output_tokens = Some(20);
        msg.model = Some("opus".to_string());

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool_uses.len(), 1);
        assert_eq!(parsed.tool_uses[0].command.as_deref(), Some("cargo test"));
        assert_eq!(parsed.duration_seconds, Some(1.5));
    }
}

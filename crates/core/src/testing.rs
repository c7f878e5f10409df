use crate::message::{Message, Role, ToolResult, ToolUse};
use chrono::{DateTime, TimeZone, Utc};

/// Timestamp `millis` after an arbitrary fixed epoch.
pub fn ts(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000 + millis).unwrap()
}

/// Bare message with the given index and role; everything else empty.
pub fn message(index: usize, kind: Role) -> Message {
    Message {
        index,
        kind,
        timestamp: None,
        text_content: String::new(),
        thinking: None,
        tool_uses: vec![],
        tool_results: vec![],
        duration_seconds: None,
        input_tokens: None,
        output_tokens: None,
        model: None,
        is_commit: false,
        commit_info: None,
        edit_loc: None,
        write_loc: None,
        git_diff_loc: None,
        preview: None,
        is_rejection: false,
        is_tool_error: false,
        is_command_failure: false,
    }
}

/// User input message with text, timestamped `at` millis after the epoch.
pub fn user(index: usize, text: &str, at: i64) -> Message {
    let mut msg = message(index, Role::User);
    msg.text_content = text.to_string();
    msg.timestamp = Some(ts(at));
    msg
}

/// Assistant message with text, timestamped `at` millis after the epoch.
pub fn assistant(index: usize, text: &str, at: i64) -> Message {
    let mut msg = message(index, Role::Assistant);
    msg.text_content = text.to_string();
    msg.timestamp = Some(ts(at));
    msg
}

/// Tool invocation with just an id and name.
pub fn tool_use(id: &str, name: &str) -> ToolUse {
    ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        command: None,
        file_path: None,
        pattern: None,
        query: None,
        edit_summary: None,
        write_lines: None,
    }
}

/// User-role carrier for a single tool result, timestamped `at`.
pub fn tool_result_msg(index: usize, tool_use_id: &str, at: i64) -> Message {
    let mut msg = message(index, Role::User);
    msg.timestamp = Some(ts(at));
    msg.tool_results.push(ToolResult {
        tool_use_id: tool_use_id.to_string(),
        is_error: false,
        content: None,
    });
    msg
}

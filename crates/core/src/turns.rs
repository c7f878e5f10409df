use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classify::{MessageClass, classify};
use crate::message::{Message, ToolResult, ToolUse};

/// One exchange unit of the reconstructed conversation: a user input, or a
/// run of assistant activity bounded by the next user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(UserTurn),
    Assistant(AssistantTurn),
}

impl Turn {
    pub fn message_indices(&self) -> &[usize] {
        match self {
            Turn::User(turn) => &turn.message_indices,
            Turn::Assistant(turn) => &turn.message_indices,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Turn::User(turn) => turn.timestamp,
            Turn::Assistant(turn) => turn.timestamp,
        }
    }
}

/// A single user input. Closed at creation; never grows.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTurn {
    pub content: String,
    pub message_indices: Vec<usize>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A run of assistant activity: text/thinking and tool invocations, with
/// running totals accumulated from every message in the run.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantTurn {
    pub segments: Vec<Segment>,
    pub message_indices: Vec<usize>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_seconds: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub model: Option<String>,
    pub has_commit: bool,
    pub commit_info: Option<serde_json::Value>,
}

/// Sub-unit of an assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(TextSegment),
    Tool(ToolSegment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub content: String,
    pub thinking: Option<String>,
    pub message_index: usize,
}

/// One tool invocation and, once attached, its result. The result is
/// write-once: it never changes after attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSegment {
    pub tool: ToolUse,
    pub result: Option<ToolResult>,
    pub message_index: usize,
    pub result_message_index: Option<usize>,
}

/// Group messages into turns with a single pass in index order.
///
/// The fold state is the currently open assistant turn, or nothing: user
/// inputs flush it and emit a closed [`UserTurn`]; assistant messages open
/// or extend it; tool-result carriers resolve its pending tool segments.
/// A tool result arriving with no open turn is dropped (data-quality
/// signal, not a fault).
pub fn assemble_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut open: Option<AssistantTurn> = None;

    for msg in messages {
        match classify(msg) {
            Some(MessageClass::UserInput) => {
                if let Some(turn) = open.take() {
                    turns.push(Turn::Assistant(turn));
                }
                turns.push(Turn::User(UserTurn {
                    content: msg.text_content.clone(),
                    message_indices: vec![msg.index],
                    timestamp: msg.timestamp,
                }));
            }
            Some(MessageClass::AssistantStep) => {
                let turn = open.get_or_insert_with(|| AssistantTurn {
                    segments: Vec::new(),
                    message_indices: Vec::new(),
                    total_input_tokens: 0,
                    total_output_tokens: 0,
                    total_duration_seconds: 0.0,
                    timestamp: msg.timestamp,
                    model: msg.model.clone(),
                    has_commit: false,
                    commit_info: None,
                });
                append_assistant_message(turn, msg);
            }
            Some(MessageClass::ToolResultCarrier) => match open.as_mut() {
                Some(turn) => {
                    for result in &msg.tool_results {
                        attach_result(turn, result, msg.index);
                    }
                    turn.message_indices.push(msg.index);
                }
                None => {
                    debug!(index = msg.index, "tool result outside any assistant turn, dropped");
                }
            },
            None => {}
        }
    }

    if let Some(turn) = open.take() {
        turns.push(Turn::Assistant(turn));
    }
    turns
}

fn append_assistant_message(turn: &mut AssistantTurn, msg: &Message) {
    if !msg.text_content.trim().is_empty() {
        turn.segments.push(Segment::Text(TextSegment {
            content: msg.text_content.clone(),
            thinking: msg.thinking.clone(),
            message_index: msg.index,
        }));
    }
    for tool in &msg.tool_uses {
        turn.segments.push(Segment::Tool(ToolSegment {
            tool: tool.clone(),
            result: None,
            message_index: msg.index,
            result_message_index: None,
        }));
    }
    turn.total_input_tokens += msg.input_tokens.unwrap_or(0);
    turn.total_output_tokens += msg.output_tokens.unwrap_or(0);
    if let Some(secs) = msg.duration_seconds {
        turn.total_duration_seconds += secs;
    }
    if msg.is_commit {
        turn.has_commit = true;
        turn.commit_info = msg.commit_info.clone();
    }
    turn.message_indices.push(msg.index);
}

/// Attach a result to the first still-unresolved tool segment with a
/// matching invocation id.
fn attach_result(turn: &mut AssistantTurn, result: &ToolResult, result_index: usize) {
    let slot = turn.segments.iter_mut().find_map(|segment| match segment {
        Segment::Tool(tool) if tool.result.is_none() && tool.tool.id == result.tool_use_id => {
            Some(tool)
        }
        _ => None,
    });
    match slot {
        Some(tool) => {
            tool.result = Some(result.clone());
            tool.result_message_index = Some(result_index);
        }
        None => {
            debug!(
                tool_use_id = %result.tool_use_id,
                "tool result without an unresolved invocation, dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn user_then_assistant_yields_two_turns() {
        let messages = vec![
            testing::user(0, "hi", 0),
            testing::assistant(1, "hello", 2000),
        ];
        let turns = assemble_turns(&messages);
        assert_eq!(turns.len(), 2);
        assert!(matches!(turns[0], Turn::User(_)));
        assert!(matches!(turns[1], Turn::Assistant(_)));
    }

    #[test]
    fn consecutive_assistant_messages_share_one_turn() {
        let mut first = testing::assistant(0, "thinking it through", 0);
        first.input_tokens = Some(10);
        first.output_tokens = Some(5);
        first.duration_seconds = Some(1.0);
        let mut second = testing::assistant(1, "done", 1000);
        second.input_tokens = Some(20);
        second.output_tokens = Some(15);
        second.duration_seconds = Some(2.0);

        let turns = assemble_turns(&[first, second]);
        assert_eq!(turns.len(), 1);
        let Turn::Assistant(turn) = &turns[0] else {
            panic!("expected assistant turn");
        };
        assert_eq!(turn.segments.len(), 2);
        assert_eq!(turn.message_indices, vec![0, 1]);
        assert_eq!(turn.total_input_tokens, 30);
        assert_eq!(turn.total_output_tokens, 20);
        assert_eq!(turn.total_duration_seconds, 3.0);
    }

    #[test]
    fn tool_result_resolves_first_unresolved_matching_segment() {
        let mut call = testing::assistant(0, "", 0);
        call.tool_uses.push(testing::tool_use("a", "Bash"));
        call.tool_uses.push(testing::tool_use("a", "Bash"));

        let turns = assemble_turns(&[
            call,
            testing::tool_result_msg(1, "a", 500),
            testing::tool_result_msg(2, "a", 900),
        ]);
        let Turn::Assistant(turn) = &turns[0] else {
            panic!("expected assistant turn");
        };
        let resolved: Vec<Option<usize>> = turn
            .segments
            .iter()
            .map(|s| match s {
                Segment::Tool(t) => t.result_message_index,
                Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(resolved, vec![Some(1), Some(2)]);
    }

    #[test]
    fn orphan_tool_result_is_dropped() {
        let turns = assemble_turns(&[
            testing::tool_result_msg(0, "nobody", 0),
            testing::user(1, "hi", 100),
        ]);
        assert_eq!(turns.len(), 1);
        assert!(matches!(turns[0], Turn::User(_)));
    }

    #[test]
    fn user_input_closes_the_open_assistant_turn() {
        let messages = vec![
            testing::assistant(0, "working", 0),
            testing::user(1, "stop", 1000),
            testing::assistant(2, "ok", 2000),
        ];
        let turns = assemble_turns(&messages);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].message_indices(), &[0]);
        assert_eq!(turns[1].message_indices(), &[1]);
        assert_eq!(turns[2].message_indices(), &[2]);
    }

    #[test]
    fn commit_marker_sets_turn_commit_info() {
        let mut msg = testing::assistant(0, "committed", 0);
        msg.is_commit = true;
        msg.commit_info = Some(serde_json::json!({"hash": "abc123"}));
        let turns = assemble_turns(&[msg]);
        let Turn::Assistant(turn) = &turns[0] else {
            panic!("expected assistant turn");
        };
        assert!(turn.has_commit);
        assert_eq!(turn.commit_info.as_ref().unwrap()["hash"], "abc123");
    }

    #[test]
    fn empty_user_messages_own_no_turn() {
        let messages = vec![
            testing::user(0, "", 0),
            testing::assistant(1, "unprompted", 100),
        ];
        let turns = assemble_turns(&messages);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].message_indices(), &[1]);
    }

    /// Flattening the turn output reproduces the original index sequence,
    /// with no duplicates or omissions except dropped orphan results.
    #[test]
    fn flattened_indices_reproduce_the_input_sequence() {
        let mut call = testing::assistant(1, "let me look", 1000);
        call.tool_uses.push(testing::tool_use("a", "Read"));
        let messages = vec![
            testing::user(0, "hi", 0),
            call,
            testing::tool_result_msg(2, "a", 1500),
            testing::user(3, "thanks", 2000),
            testing::assistant(4, "welcome", 2500),
        ];

        let turns = assemble_turns(&messages);
        let flattened: Vec<usize> = turns
            .iter()
            .flat_map(|t| t.message_indices().iter().copied())
            .collect();
        assert_eq!(flattened, vec![0, 1, 2, 3, 4]);
    }

    /// A greeting, one assistant reply carrying a Bash call, its result.
    #[test]
    fn scenario_user_assistant_tool_result() {
        let mut call = testing::assistant(1, "hello", 2000);
        let mut tool = testing::tool_use("a", "Bash");
        tool.command = Some("ls".to_string());
        call.tool_uses.push(tool);
        call.duration_seconds = Some(2.0);

        let turns = assemble_turns(&[
            testing::user(0, "hi", 0),
            call,
            testing::tool_result_msg(2, "a", 2500),
        ]);

        assert_eq!(turns.len(), 2);
        let Turn::User(user) = &turns[0] else {
            panic!("expected user turn");
        };
        assert_eq!(user.content, "hi");

        let Turn::Assistant(turn) = &turns[1] else {
            panic!("expected assistant turn");
        };
        assert_eq!(turn.segments.len(), 2);
        assert!(matches!(&turn.segments[0], Segment::Text(t) if t.content == "hello"));
        let Segment::Tool(tool) = &turn.segments[1] else {
            panic!("expected tool segment");
        };
        assert_eq!(tool.tool.name, "Bash");
        assert!(tool.result.is_some());
        assert_eq!(tool.result_message_index, Some(2));
        assert_eq!(turn.message_indices, vec![1, 2]);
    }
}

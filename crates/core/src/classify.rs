use crate::message::{Message, Role};

/// Role a message plays during reconstruction.
///
/// At most one class applies to a message; a message matching none (e.g. a
/// user message with only whitespace) is skipped by every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// Human input: user-role, non-empty text, no tool results attached.
    UserInput,
    /// Any assistant-role message, regardless of content.
    AssistantStep,
    /// User-role envelope whose purpose is carrying tool results.
    ToolResultCarrier,
}

/// Classify a raw message. Mutual exclusion holds by construction: tool
/// results take precedence over text on user-role messages.
pub fn classify(msg: &Message) -> Option<MessageClass> {
    match msg.kind {
        Role::Assistant => Some(MessageClass::AssistantStep),
        Role::User if !msg.tool_results.is_empty() => Some(MessageClass::ToolResultCarrier),
        Role::User if !msg.text_content.trim().is_empty() => Some(MessageClass::UserInput),
        Role::User | Role::Other => None,
    }
}

use crate::message::{LocDelta, Message};

/// Rollups computable from the message list alone. Order-independent: the
/// same multiset of messages always produces the same totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageTotals {
    pub commits: u64,
    pub tool_loc: LocDelta,
    pub git_loc: LocDelta,
    pub git_loc_found: bool,
}

/// Single pass over the message list. Missing numeric fields contribute
/// zero; a Write has no removed component.
pub fn message_totals(messages: &[Message]) -> MessageTotals {
    let mut totals = MessageTotals::default();
    for msg in messages {
        if msg.is_commit {
            totals.commits += 1;
        }
        if let Some(edit) = msg.edit_loc {
            totals.tool_loc.added += edit.added;
            totals.tool_loc.removed += edit.removed;
        }
        if let Some(written) = msg.write_loc {
            totals.tool_loc.added += written;
        }
        if let Some(diff) = msg.git_diff_loc {
            totals.git_loc_found = true;
            totals.git_loc.added += diff.added;
            totals.git_loc.removed += diff.removed;
        }
    }
    totals
}

/// Session-level fields supplied by the session-detail collaborator; the
/// engine never computes these itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionFacts {
    pub duration_seconds: Option<f64>,
    pub agent_time_seconds: Option<f64>,
    pub tool_time_seconds: Option<f64>,
    pub error_count: u64,
}

/// Combined session summary shown in the detail header. Recomputed from
/// scratch whenever the message set changes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub duration_seconds: Option<f64>,
    pub agent_time_seconds: Option<f64>,
    pub tool_time_seconds: Option<f64>,
    pub error_count: u64,
    pub commits: u64,
    pub tool_loc: LocDelta,
    /// `None` when no message carried a git diff.
    pub git_loc: Option<LocDelta>,
}

pub fn summarize(facts: SessionFacts, messages: &[Message]) -> Summary {
    let totals = message_totals(messages);
    Summary {
        duration_seconds: facts.duration_seconds,
        agent_time_seconds: facts.agent_time_seconds,
        tool_time_seconds: facts.tool_time_seconds,
        error_count: facts.error_count,
        commits: totals.commits,
        tool_loc: totals.tool_loc,
        git_loc: totals.git_loc_found.then_some(totals.git_loc),
    }
}

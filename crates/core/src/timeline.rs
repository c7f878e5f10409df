use std::collections::HashMap;

use tracing::debug;

use crate::classify::{MessageClass, classify};
use crate::message::{Message, Role};

/// Gap tolerance for coalescing consecutive same-kind events.
pub const MERGE_GAP_MS: i64 = 60_000;

/// Kind of observed activity on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A user input; instantaneous.
    User,
    /// An assistant working span, ending at its message timestamp.
    Ai,
    /// A tool execution span.
    Tool,
}

/// One typed instant or interval of activity, in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub kind: EventKind,
    pub timestamp_ms: i64,
    pub duration_ms: i64,
    pub tool_id: Option<String>,
    pub tool_name: Option<String>,
}

impl TimelineEvent {
    fn instant(kind: EventKind, timestamp_ms: i64) -> Self {
        Self {
            kind,
            timestamp_ms,
            duration_ms: 0,
            tool_id: None,
            tool_name: None,
        }
    }

    pub fn end_ms(&self) -> i64 {
        self.timestamp_ms + self.duration_ms
    }
}

/// Convert messages into activity events.
///
/// Two explicit passes: an emit pass producing events with tool durations
/// still unresolved, then a resolution pass producing the final list with
/// durations filled in from tool-result messages. The result is sorted
/// ascending by timestamp; ties keep emission order.
pub fn extract_events(messages: &[Message]) -> Vec<TimelineEvent> {
    let emitted = emit_events(messages);
    let mut events = resolve_tool_durations(emitted, messages);
    events.sort_by_key(|event| event.timestamp_ms);
    events
}

fn emit_events(messages: &[Message]) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    for msg in messages {
        // A missing timestamp excludes a message from the timeline only.
        let Some(ts) = msg.timestamp else { continue };
        let ts_ms = ts.timestamp_millis();

        match classify(msg) {
            Some(MessageClass::UserInput) => {
                events.push(TimelineEvent::instant(EventKind::User, ts_ms));
            }
            Some(MessageClass::AssistantStep) => {
                if let Some(secs) = msg.duration_seconds
                    && secs > 0.0
                {
                    // The timestamp marks completion; the span ends there.
                    let duration_ms = (secs * 1000.0) as i64;
                    events.push(TimelineEvent {
                        kind: EventKind::Ai,
                        timestamp_ms: ts_ms - duration_ms,
                        duration_ms,
                        tool_id: None,
                        tool_name: None,
                    });
                }
                for tool in &msg.tool_uses {
                    events.push(TimelineEvent {
                        kind: EventKind::Tool,
                        timestamp_ms: ts_ms,
                        duration_ms: 0,
                        tool_id: Some(tool.id.clone()),
                        tool_name: Some(tool.name.clone()),
                    });
                }
            }
            _ => {}
        }
    }
    events
}

fn resolve_tool_durations(
    mut events: Vec<TimelineEvent>,
    messages: &[Message],
) -> Vec<TimelineEvent> {
    // First emitted event per invocation id; consumed once resolved.
    let mut pending: HashMap<String, usize> = HashMap::new();
    for (i, event) in events.iter().enumerate() {
        if let Some(id) = &event.tool_id {
            pending.entry(id.clone()).or_insert(i);
        }
    }

    for msg in messages {
        if msg.kind != Role::User || msg.tool_results.is_empty() {
            continue;
        }
        let Some(ts) = msg.timestamp else { continue };
        let result_ms = ts.timestamp_millis();
        for result in &msg.tool_results {
            match pending.remove(&result.tool_use_id) {
                Some(i) => events[i].duration_ms = result_ms - events[i].timestamp_ms,
                None => {
                    debug!(
                        tool_use_id = %result.tool_use_id,
                        "tool result without a timeline event, ignored"
                    );
                }
            }
        }
    }
    events
}

/// Coalesce visually insignificant fragmentation: consecutive events of the
/// same kind whose gap is within [`MERGE_GAP_MS`] become one interval.
/// Extension is monotonic; the merged end never shrinks. Idempotent.
pub fn merge_events(events: &[TimelineEvent]) -> Vec<TimelineEvent> {
    let mut merged = Vec::new();
    let mut acc: Option<TimelineEvent> = None;

    for event in events {
        if let Some(current) = acc.as_mut()
            && current.kind == event.kind
            && event.timestamp_ms - current.end_ms() <= MERGE_GAP_MS
        {
            let end = event.end_ms().max(current.end_ms());
            current.duration_ms = end - current.timestamp_ms;
            continue;
        }
        if let Some(done) = acc.replace(event.clone()) {
            merged.push(done);
        }
    }
    if let Some(done) = acc {
        merged.push(done);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn tool_event(timestamp_ms: i64, duration_ms: i64) -> TimelineEvent {
        TimelineEvent {
            kind: EventKind::Tool,
            timestamp_ms,
            duration_ms,
            tool_id: None,
            tool_name: None,
        }
    }

    /// Expected shape: user instant at 0, ai interval [0, 2000], tool span
    /// of 500ms starting at 2000 once its result arrives.
    #[test]
    fn scenario_extraction_with_result_resolution() {
        let mut call = testing::assistant(1, "hello", 2000);
        call.tool_uses.push(testing::tool_use("a", "Bash"));
        call.duration_seconds = Some(2.0);

        let events = extract_events(&[
            testing::user(0, "hi", 0),
            call,
            testing::tool_result_msg(2, "a", 2500),
        ]);

        let base = testing::ts(0).timestamp_millis();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::User);
        assert_eq!(events[0].timestamp_ms, base);
        assert_eq!(events[0].duration_ms, 0);

        assert_eq!(events[1].kind, EventKind::Ai);
        assert_eq!(events[1].timestamp_ms, base);
        assert_eq!(events[1].duration_ms, 2000);

        assert_eq!(events[2].kind, EventKind::Tool);
        assert_eq!(events[2].timestamp_ms, base + 2000);
        assert_eq!(events[2].duration_ms, 500);
        assert_eq!(events[2].tool_name.as_deref(), Some("Bash"));
    }

    #[test]
    fn message_without_timestamp_is_excluded() {
        let mut msg = testing::user(0, "hi", 0);
        msg.timestamp = None;
        assert!(extract_events(&[msg]).is_empty());
    }

    #[test]
    fn assistant_without_duration_emits_no_ai_event() {
        let events = extract_events(&[testing::assistant(0, "hello", 1000)]);
        assert!(events.is_empty());
    }

    #[test]
    fn unmatched_tool_result_is_ignored() {
        let mut call = testing::assistant(0, "", 0);
        call.tool_uses.push(testing::tool_use("a", "Read"));
        let events = extract_events(&[call, testing::tool_result_msg(1, "zzz", 700)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration_ms, 0);
    }

    #[test]
    fn events_are_sorted_by_timestamp() {
        // The ai interval starts before the user instant that preceded it in
        // emission order once the duration is subtracted out.
        let mut work = testing::assistant(0, "", 5000);
        work.duration_seconds = Some(5.0);
        let events = extract_events(&[work, testing::user(1, "next", 4000)]);
        assert_eq!(events[0].kind, EventKind::Ai);
        assert_eq!(events[1].kind, EventKind::User);
    }

    #[test]
    fn events_within_gap_merge_into_one_interval() {
        // Two tool spans 30s apart, within the 60s tolerance.
        let merged = merge_events(&[tool_event(0, 1000), tool_event(30_000, 2000)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].timestamp_ms, 0);
        assert_eq!(merged[0].duration_ms, 32_000);
    }

    #[test]
    fn events_beyond_gap_stay_separate() {
        let merged = merge_events(&[tool_event(0, 1000), tool_event(90_000, 2000)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn different_kinds_never_merge() {
        let user = TimelineEvent::instant(EventKind::User, 500);
        let merged = merge_events(&[tool_event(0, 100), user.clone()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1], user);
    }

    #[test]
    fn merged_interval_never_shrinks() {
        // Second event is contained in the first; the end must not move back.
        let merged = merge_events(&[tool_event(0, 10_000), tool_event(2000, 1000)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].duration_ms, 10_000);
    }

    #[test]
    fn merge_is_idempotent() {
        let events = vec![
            tool_event(0, 1000),
            tool_event(30_000, 2000),
            tool_event(120_000, 500),
            TimelineEvent::instant(EventKind::User, 121_000),
        ];
        let once = merge_events(&events);
        let twice = merge_events(&once);
        assert_eq!(once, twice);
    }
}

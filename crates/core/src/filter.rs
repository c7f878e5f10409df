use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::turns::{Segment, Turn};

/// Quiet period between the last keystroke and the search request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Narrow turns against a match-id set from the search collaborator.
///
/// `None` means no active filter: every turn passes through. With a set,
/// user turns are kept iff any of their message indices match; assistant
/// turns keep only their matching segments and are dropped when none match.
pub fn filter_turns(turns: &[Turn], matches: Option<&HashSet<usize>>) -> Vec<Turn> {
    let Some(matches) = matches else {
        return turns.to_vec();
    };

    let mut kept = Vec::new();
    for turn in turns {
        match turn {
            Turn::User(user) => {
                if user.message_indices.iter().any(|i| matches.contains(i)) {
                    kept.push(Turn::User(user.clone()));
                }
            }
            Turn::Assistant(assistant) => {
                let segments: Vec<Segment> = assistant
                    .segments
                    .iter()
                    .filter(|segment| segment_matches(segment, matches))
                    .cloned()
                    .collect();
                if !segments.is_empty() {
                    let mut filtered = assistant.clone();
                    filtered.segments = segments;
                    kept.push(Turn::Assistant(filtered));
                }
            }
        }
    }
    kept
}

fn segment_matches(segment: &Segment, matches: &HashSet<usize>) -> bool {
    match segment {
        Segment::Text(text) => matches.contains(&text.message_index),
        Segment::Tool(tool) => {
            matches.contains(&tool.message_index)
                || tool.result_message_index.is_some_and(|i| matches.contains(&i))
        }
    }
}

/// Single reusable quiet-period timer slot. Each keystroke re-arms it;
/// clearing disarms it; [`Debouncer::fire`] reports due-ness exactly once
/// per arm.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True when the quiet period has elapsed; disarms the slot so the
    /// caller fires at most once per arm.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::turns::assemble_turns;

    fn scenario_turns() -> Vec<Turn> {
        let mut call = testing::assistant(1, "hello", 2000);
        call.tool_uses.push(testing::tool_use("a", "Bash"));
        call.duration_seconds = Some(2.0);
        assemble_turns(&[
            testing::user(0, "hi", 0),
            call,
            testing::tool_result_msg(2, "a", 2500),
        ])
    }

    #[test]
    fn no_filter_passes_everything_through() {
        let turns = scenario_turns();
        assert_eq!(filter_turns(&turns, None), turns);
    }

    #[test]
    fn empty_match_set_drops_everything() {
        let turns = scenario_turns();
        assert!(filter_turns(&turns, Some(&HashSet::new())).is_empty());
    }

    /// A match on the tool result's message index keeps the assistant turn
    /// with only the tool segment retained.
    #[test]
    fn result_index_match_keeps_only_the_tool_segment() {
        let turns = scenario_turns();
        let matches = HashSet::from([2]);
        let filtered = filter_turns(&turns, Some(&matches));

        assert_eq!(filtered.len(), 1);
        let Turn::Assistant(turn) = &filtered[0] else {
            panic!("expected assistant turn");
        };
        assert_eq!(turn.segments.len(), 1);
        assert!(matches!(&turn.segments[0], Segment::Tool(t) if t.tool.name == "Bash"));
    }

    #[test]
    fn user_turn_kept_on_index_match() {
        let turns = scenario_turns();
        let matches = HashSet::from([0]);
        let filtered = filter_turns(&turns, Some(&matches));
        assert_eq!(filtered.len(), 1);
        assert!(matches!(filtered[0], Turn::User(_)));
    }

    #[test]
    fn debouncer_fires_once_after_quiet_period() {
        let mut debounce = Debouncer::new(Duration::from_millis(300));
        let t0 = Instant::now();
        debounce.rearm(t0);
        assert!(!debounce.fire(t0 + Duration::from_millis(100)));
        assert!(debounce.fire(t0 + Duration::from_millis(300)));
        assert!(!debounce.fire(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn rearming_extends_the_deadline() {
        let mut debounce = Debouncer::new(Duration::from_millis(300));
        let t0 = Instant::now();
        debounce.rearm(t0);
        debounce.rearm(t0 + Duration::from_millis(200));
        assert!(!debounce.fire(t0 + Duration::from_millis(350)));
        assert!(debounce.fire(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn clear_disarms_the_slot() {
        let mut debounce = Debouncer::new(Duration::from_millis(300));
        let t0 = Instant::now();
        debounce.rearm(t0);
        debounce.clear();
        assert!(!debounce.is_armed());
        assert!(!debounce.fire(t0 + Duration::from_secs(1)));
    }
}

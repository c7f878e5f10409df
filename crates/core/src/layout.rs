use crate::timeline::{EventKind, TimelineEvent};

/// Floor for the proportional scale; keeps degenerate single-instant
/// sessions from dividing by zero.
const MIN_TOTAL_DURATION_MS: i64 = 1000;

/// One positioned primitive of the activity strip. Geometry only: the
/// kind-to-style mapping is applied at draw time by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSpan {
    pub kind: EventKind,
    pub left_percent: f64,
    /// `None` for point events, which render as a fixed-size marker
    /// centered on `left_percent` instead of scaling with duration.
    pub width_percent: Option<f64>,
}

/// Map merged events onto a proportional scale for a container that is
/// `width_px` pixels wide.
///
/// Interval widths are clamped so nothing renders below one pixel; a
/// clamped span is also shifted left as needed so it never overflows the
/// container.
pub fn layout_events(events: &[TimelineEvent], width_px: f64) -> Vec<TimelineSpan> {
    let Some(start) = events.iter().map(|e| e.timestamp_ms).min() else {
        return Vec::new();
    };
    let end = events.iter().map(TimelineEvent::end_ms).max().unwrap_or(start);
    let total = (end - start).max(MIN_TOTAL_DURATION_MS) as f64;
    let min_width_percent = if width_px > 0.0 {
        (100.0 / width_px).min(100.0)
    } else {
        0.0
    };

    events
        .iter()
        .map(|event| {
            let mut left_percent = (event.timestamp_ms - start) as f64 / total * 100.0;
            let width_percent = match event.kind {
                EventKind::User => None,
                EventKind::Ai | EventKind::Tool => {
                    let natural = event.duration_ms as f64 / total * 100.0;
                    let clamped = natural.max(min_width_percent);
                    if clamped > natural {
                        left_percent = left_percent.min(100.0 - clamped);
                    }
                    Some(clamped)
                }
            };
            TimelineSpan {
                kind: event.kind,
                left_percent,
                width_percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, timestamp_ms: i64, duration_ms: i64) -> TimelineEvent {
        TimelineEvent {
            kind,
            timestamp_ms,
            duration_ms,
            tool_id: None,
            tool_name: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(layout_events(&[], 200.0).is_empty());
    }

    #[test]
    fn intervals_scale_proportionally() {
        let events = vec![
            event(EventKind::Ai, 0, 5000),
            event(EventKind::Tool, 5000, 5000),
        ];
        let spans = layout_events(&events, 200.0);
        assert_eq!(spans[0].left_percent, 0.0);
        assert_eq!(spans[0].width_percent, Some(50.0));
        assert_eq!(spans[1].left_percent, 50.0);
        assert_eq!(spans[1].width_percent, Some(50.0));
    }

    #[test]
    fn point_events_have_no_width() {
        let events = vec![
            event(EventKind::User, 0, 0),
            event(EventKind::Ai, 0, 5000),
        ];
        let spans = layout_events(&events, 200.0);
        assert_eq!(spans[0].width_percent, None);
    }

    #[test]
    fn near_zero_intervals_stay_visible() {
        // 10ms tool span on a 100s scale: far below one pixel of a 200px
        // container, so the width clamps to one pixel's worth.
        let events = vec![
            event(EventKind::Ai, 0, 100_000),
            event(EventKind::Tool, 50_000, 10),
        ];
        let spans = layout_events(&events, 200.0);
        let floor = 100.0 / 200.0;
        assert_eq!(spans[1].width_percent, Some(floor));
    }

    #[test]
    fn spans_never_overflow_the_container() {
        // A tiny interval at the very end would overflow once clamped.
        let events = vec![
            event(EventKind::Ai, 0, 100_000),
            event(EventKind::Tool, 100_000, 1),
        ];
        for span in layout_events(&events, 80.0) {
            let width = span.width_percent.unwrap_or(0.0);
            assert!(
                span.left_percent + width <= 100.0 + f64::EPSILON,
                "span overflows: left {} width {}",
                span.left_percent,
                width
            );
        }
    }

    #[test]
    fn degenerate_duration_floors_to_one_second() {
        // Two instants at the same moment; the scale floors to 1000ms.
        let events = vec![
            event(EventKind::User, 0, 0),
            event(EventKind::Tool, 0, 0),
        ];
        let spans = layout_events(&events, 200.0);
        assert_eq!(spans[0].left_percent, 0.0);
        assert_eq!(spans[1].left_percent, 0.0);
    }
}

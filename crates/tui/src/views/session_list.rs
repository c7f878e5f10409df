use crate::app::App;
use crate::theme::Theme;
use chrono::{DateTime, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, Paragraph};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.filtered_sessions.is_empty() {
        let msg = if app.loading_sessions {
            "Loading sessions..."
        } else if app.session_matches.is_some() {
            "No sessions match the current search."
        } else {
            "No sessions found. Is the loupe server running?"
        };
        render_empty(frame, area, msg);
        return;
    }

    let items: Vec<ListItem> = app
        .filtered_sessions
        .iter()
        .map(|&idx| {
            let session = &app.sessions[idx];

            // Line 1: project + session id
            let line1 = Line::from(vec![
                Span::styled(
                    session.project_name.clone(),
                    Style::new().fg(Theme::TEXT_PRIMARY).bold(),
                ),
                Span::styled(
                    format!("  {}", short_id(&session.session_id)),
                    Style::new().fg(Theme::TEXT_MUTED),
                ),
            ]);

            // Line 2: metadata with subtle separators
            let mut line2_spans = vec![
                Span::raw("   "),
                Span::styled(
                    format_start(session.start_time),
                    Style::new().fg(Theme::TEXT_PRIMARY),
                ),
                Span::styled("  ", Style::new().fg(Theme::TEXT_MUTED)),
                Span::styled(
                    format_duration(session.duration_seconds),
                    Style::new().fg(Theme::ACCENT_CYAN),
                ),
                Span::styled("  ", Style::new().fg(Theme::TEXT_MUTED)),
                Span::styled(
                    format_tokens(session.input_tokens, session.output_tokens),
                    Style::new().fg(Theme::ACCENT_BLUE),
                ),
            ];
            if session.commit_count > 0 {
                line2_spans.push(Span::styled("  ", Style::new().fg(Theme::TEXT_MUTED)));
                line2_spans.push(Span::styled(
                    format!("{} commits", session.commit_count),
                    Style::new().fg(Theme::ACCENT_GREEN),
                ));
            }
            if session.error_count > 0 {
                line2_spans.push(Span::styled("  ", Style::new().fg(Theme::TEXT_MUTED)));
                line2_spans.push(Span::styled(
                    format!("{} errors", session.error_count),
                    Style::new().fg(Theme::ACCENT_RED),
                ));
            }

            ListItem::new(vec![line1, Line::from(line2_spans), Line::raw("")])
        })
        .collect();

    let list = List::new(items)
        .block(Theme::block_dim().title(" sessions "))
        .highlight_style(
            Style::new()
                .bg(Theme::BG_SURFACE)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(" > ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always);

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_empty(frame: &mut Frame, area: Rect, msg: &str) {
    let paragraph = Paragraph::new(msg)
        .style(Style::new().fg(Theme::TEXT_SECONDARY))
        .alignment(Alignment::Center)
        .block(Theme::block_dim().padding(Theme::PADDING_CARD));
    frame.render_widget(paragraph, area);
}

fn short_id(id: &str) -> String {
    if id.len() > 8 {
        format!("{}…", &id[..8])
    } else {
        id.to_string()
    }
}

fn format_start(start: Option<DateTime<Utc>>) -> String {
    match start {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "unknown".to_string(),
    }
}

pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds else {
        return "--".to_string();
    };
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

fn format_tokens(input: Option<u64>, output: Option<u64>) -> String {
    format!(
        "{}→{} tok",
        compact_count(input.unwrap_or(0)),
        compact_count(output.unwrap_or(0))
    )
}

fn compact_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

use crate::app::{App, SessionView};
use crate::theme::{self, Theme};
use crate::views::session_list::format_duration;
use chrono::{DateTime, Local, Utc};
use loupe_core::layout::{TimelineSpan, layout_events};
use loupe_core::message::{LocDelta, Message, ToolUse};
use loupe_core::timeline::EventKind;
use loupe_core::turns::{AssistantTurn, Segment, Turn, UserTurn};
use ratatui::prelude::*;
use ratatui::widgets::{Clear, List, ListItem, ListState, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(view) = &app.detail else {
        let msg = if app.detail_loading {
            "Loading session..."
        } else {
            "No session loaded."
        };
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::new().fg(Theme::TEXT_SECONDARY))
                .alignment(Alignment::Center)
                .block(Theme::block_dim().padding(Theme::PADDING_CARD)),
            area,
        );
        return;
    };

    let [summary_area, strip_area, transcript_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    render_summary(frame, view, summary_area);
    render_strip(frame, view, strip_area);

    let turns = app.visible_turns();
    render_transcript(
        frame,
        &turns,
        &view.messages,
        app.turn_index,
        transcript_area,
        app.message_matches.is_some(),
    );
}

// ── Summary panel ────────────────────────────────────────────────────

fn render_summary(frame: &mut Frame, view: &SessionView, area: Rect) {
    let block = Theme::block_dim().title(" summary ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary = &view.summary;
    let label = Style::new().fg(Theme::TEXT_MUTED);
    let value = Style::new().fg(Theme::TEXT_PRIMARY);

    let line1 = Line::from(vec![
        Span::styled(" duration ", label),
        Span::styled(format_duration(summary.duration_seconds), value),
        Span::styled("   agent ", label),
        Span::styled(format_duration(summary.agent_time_seconds), value),
        Span::styled("   tool ", label),
        Span::styled(format_duration(summary.tool_time_seconds), value),
        Span::styled("   errors ", label),
        Span::styled(
            summary.error_count.to_string(),
            if summary.error_count > 0 {
                Style::new().fg(Theme::ACCENT_RED)
            } else {
                value
            },
        ),
    ]);

    let line2 = Line::from(vec![
        Span::styled(" commits ", label),
        Span::styled(
            summary.commits.to_string(),
            Style::new().fg(Theme::ACCENT_GREEN),
        ),
        Span::styled("   tool loc ", label),
        Span::styled(format_loc(Some(summary.tool_loc)), value),
        Span::styled("   git loc ", label),
        Span::styled(format_loc(summary.git_loc), value),
    ]);

    let line3 = Line::from(vec![
        Span::styled(" messages ", label),
        Span::styled(breakdown_label(view), Style::new().fg(Theme::TEXT_SECONDARY)),
    ]);

    frame.render_widget(Paragraph::new(vec![line1, line2, line3]), inner);
}

fn format_loc(loc: Option<LocDelta>) -> String {
    match loc {
        Some(loc) => format!("+{}/-{}", loc.added, loc.removed),
        None => "--".to_string(),
    }
}

fn breakdown_label(view: &SessionView) -> String {
    if view.breakdown.breakdown.is_empty() {
        return format!("{} total", view.messages.len());
    }
    let top: Vec<String> = view
        .breakdown
        .breakdown
        .iter()
        .take(4)
        .map(|entry| format!("{} {}", entry.category, entry.count))
        .collect();
    format!("{} ({} total)", top.join(" · "), view.breakdown.total)
}

// ── Activity strip ───────────────────────────────────────────────────

fn render_strip(frame: &mut Frame, view: &SessionView, area: Rect) {
    let block = Theme::block_dim().title(" activity ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 {
        return;
    }

    let spans = layout_events(&view.events, inner.width as f64);
    let cells = strip_cells(&spans, inner.width as usize);
    frame.render_widget(Paragraph::new(cells_to_line(&cells)), inner);
}

/// Paint layout spans into a row of cells, one cell per pixel. Intervals
/// are painted first so the fixed-size point markers stay visible on top.
pub(crate) fn strip_cells(spans: &[TimelineSpan], width: usize) -> Vec<Option<EventKind>> {
    let mut cells = vec![None; width];
    if width == 0 {
        return cells;
    }

    for span in spans {
        if let Some(width_percent) = span.width_percent {
            let start = ((span.left_percent / 100.0) * width as f64).floor() as usize;
            let len = ((width_percent / 100.0) * width as f64).ceil().max(1.0) as usize;
            for cell in cells.iter_mut().skip(start.min(width - 1)).take(len) {
                *cell = Some(span.kind);
            }
        }
    }
    for span in spans {
        if span.width_percent.is_none() {
            let pos = ((span.left_percent / 100.0) * width as f64).round() as usize;
            cells[pos.min(width - 1)] = Some(span.kind);
        }
    }
    cells
}

fn cells_to_line(cells: &[Option<EventKind>]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut run_start = 0;
    while run_start < cells.len() {
        let current = cells[run_start];
        let mut run_end = run_start;
        while run_end < cells.len() && cells[run_end] == current {
            run_end += 1;
        }
        let len = run_end - run_start;
        let span = match current {
            None => Span::styled(" ".repeat(len), Style::new()),
            Some(EventKind::User) => Span::styled(
                "│".repeat(len),
                Style::new().fg(theme::event_color(EventKind::User)).bold(),
            ),
            Some(kind) => Span::styled("█".repeat(len), Style::new().fg(theme::event_color(kind))),
        };
        spans.push(span);
        run_start = run_end;
    }
    Line::from(spans)
}

// ── Transcript ───────────────────────────────────────────────────────

const MAX_TEXT_LINES: usize = 5;
const MAX_LINE_WIDTH: usize = 120;

fn render_transcript(
    frame: &mut Frame,
    turns: &[Turn],
    messages: &[Message],
    turn_index: usize,
    area: Rect,
    filtered: bool,
) {
    if turns.is_empty() {
        let msg = if filtered {
            "No turns match the current filter."
        } else {
            "Empty transcript."
        };
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::new().fg(Theme::TEXT_SECONDARY))
                .alignment(Alignment::Center)
                .block(Theme::block_dim()),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = turns.iter().map(|turn| turn_item(turn, messages)).collect();
    let title = if filtered {
        " transcript (filtered) "
    } else {
        " transcript "
    };
    let list = List::new(items)
        .block(Theme::block_dim().title(title))
        .highlight_style(Style::new().bg(Theme::BG_SURFACE))
        .highlight_symbol(" > ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always);

    let mut state = ListState::default();
    state.select(Some(turn_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn turn_item(turn: &Turn, messages: &[Message]) -> ListItem<'static> {
    let mut lines = match turn {
        Turn::User(user) => user_turn_lines(user, messages),
        Turn::Assistant(assistant) => assistant_turn_lines(assistant, messages),
    };
    lines.push(Line::raw(""));
    ListItem::new(lines)
}

fn message_by_index(messages: &[Message], index: usize) -> Option<&Message> {
    messages.iter().find(|m| m.index == index)
}

fn user_turn_lines(turn: &UserTurn, messages: &[Message]) -> Vec<Line<'static>> {
    let mut header = vec![
        Span::styled("user", Style::new().fg(Theme::ROLE_USER).bold()),
        Span::styled(
            format!("  {}", format_time(turn.timestamp)),
            Style::new().fg(Theme::TEXT_MUTED),
        ),
    ];
    let rejected = turn
        .message_indices
        .iter()
        .filter_map(|&i| message_by_index(messages, i))
        .any(|m| m.is_rejection);
    if rejected {
        header.push(Span::styled(
            "  rejected",
            Style::new().fg(Theme::ACCENT_RED),
        ));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(content_lines(&turn.content));
    lines
}

fn assistant_turn_lines(turn: &AssistantTurn, messages: &[Message]) -> Vec<Line<'static>> {
    let mut header = vec![
        Span::styled("agent", Style::new().fg(Theme::ROLE_AGENT).bold()),
        Span::styled(
            format!("  {}", format_time(turn.timestamp)),
            Style::new().fg(Theme::TEXT_MUTED),
        ),
    ];
    if let Some(model) = &turn.model {
        header.push(Span::styled(
            format!("  {model}"),
            Style::new().fg(Theme::ACCENT_BLUE),
        ));
    }
    if turn.total_duration_seconds > 0.0 {
        header.push(Span::styled(
            format!("  {:.1}s", turn.total_duration_seconds),
            Style::new().fg(Theme::ACCENT_CYAN),
        ));
    }
    if turn.total_input_tokens > 0 || turn.total_output_tokens > 0 {
        header.push(Span::styled(
            format!("  {}→{} tok", turn.total_input_tokens, turn.total_output_tokens),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ));
    }
    if turn.has_commit {
        header.push(Span::styled(
            "  ⎇ commit",
            Style::new().fg(Theme::ACCENT_GREEN).bold(),
        ));
    }
    let has_error = turn
        .message_indices
        .iter()
        .filter_map(|&i| message_by_index(messages, i))
        .any(|m| m.is_tool_error || m.is_command_failure);
    if has_error {
        header.push(Span::styled(
            "  ✗ errors",
            Style::new().fg(Theme::ACCENT_RED).bold(),
        ));
    }

    let mut lines = vec![Line::from(header)];
    for segment in &turn.segments {
        match segment {
            Segment::Text(text) => {
                if text.thinking.is_some() {
                    lines.push(Line::from(Span::styled(
                        "  (thinking)",
                        Style::new().fg(Theme::TEXT_MUTED).italic(),
                    )));
                }
                lines.extend(content_lines(&text.content));
            }
            Segment::Tool(tool) => lines.push(tool_line(tool)),
        }
    }
    lines
}

fn tool_line(segment: &loupe_core::turns::ToolSegment) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("  {} ", theme::tool_icon(&segment.tool.name)),
            Style::new().fg(Theme::ACCENT_YELLOW).bold(),
        ),
        Span::styled(
            segment.tool.name.clone(),
            Style::new().fg(Theme::ACCENT_YELLOW),
        ),
    ];
    if let Some(detail) = tool_detail(&segment.tool) {
        spans.push(Span::styled(
            format!(" {}", truncate_to_width(&detail, MAX_LINE_WIDTH)),
            Style::new().fg(Theme::TEXT_CONTENT),
        ));
    }
    match &segment.result {
        Some(result) if result.is_error => {
            spans.push(Span::styled(
                " → error",
                Style::new().fg(Theme::ACCENT_RED),
            ));
        }
        Some(_) => {
            spans.push(Span::styled(" → ok", Style::new().fg(Theme::ACCENT_GREEN)));
        }
        None => {
            spans.push(Span::styled(
                " → no result",
                Style::new().fg(Theme::TEXT_MUTED),
            ));
        }
    }
    Line::from(spans)
}

/// Most informative single detail of a tool invocation.
fn tool_detail(tool: &ToolUse) -> Option<String> {
    if let Some(command) = &tool.command {
        return Some(command.clone());
    }
    if let Some(path) = &tool.file_path {
        let mut detail = path.clone();
        if let Some(edit) = tool.edit_summary {
            detail.push_str(&format!(" ({}→{} lines)", edit.old_lines, edit.new_lines));
        } else if let Some(lines) = tool.write_lines {
            detail.push_str(&format!(" ({lines} lines)"));
        }
        return Some(detail);
    }
    tool.pattern.clone().or_else(|| tool.query.clone())
}

fn content_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = content
        .lines()
        .take(MAX_TEXT_LINES)
        .map(|line| {
            Line::from(Span::styled(
                format!("  {}", truncate_to_width(line, MAX_LINE_WIDTH)),
                Style::new().fg(Theme::TEXT_CONTENT),
            ))
        })
        .collect();
    if content.lines().count() > MAX_TEXT_LINES {
        lines.push(Line::from(Span::styled(
            "  …",
            Style::new().fg(Theme::TEXT_MUTED),
        )));
    }
    lines
}

/// Truncate to a terminal display width, appending an ellipsis when cut.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > max_width.saturating_sub(1) {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

// ── Raw message popup ────────────────────────────────────────────────

pub fn render_raw_popup(frame: &mut Frame, app: &App) {
    let Some(popup) = &app.raw_popup else {
        return;
    };

    let area = centered_rect(frame.area(), 80, 80);
    frame.render_widget(Clear, area);

    let block = Theme::block_accent().title(format!(" message {} ", popup.message_index));
    let content = match (&popup.content, &popup.preview) {
        (Some(content), _) => content.clone(),
        (None, Some(preview)) => format!("Loading...\n\n{preview}"),
        (None, None) => "Loading...".to_string(),
    };
    let paragraph = Paragraph::new(content)
        .style(Style::new().fg(Theme::TEXT_CONTENT))
        .scroll((popup.scroll, 0))
        .block(block.padding(Theme::PADDING_CARD));
    frame.render_widget(paragraph, area);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, rect, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    rect
}

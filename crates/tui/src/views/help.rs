use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

pub fn render(frame: &mut Frame, area: Rect) {
    let width = 52.min(area.width);
    let height = 18.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);

    let key = Style::new().fg(Theme::ACCENT_BLUE).bold();
    let desc = Style::new().fg(Theme::TEXT_SECONDARY);
    let section = Style::new().fg(Theme::TEXT_PRIMARY).bold();

    let row = |k: &str, d: &str| {
        Line::from(vec![
            Span::styled(format!("  {k:<10}"), key),
            Span::styled(d.to_string(), desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(" Session list", section)),
        row("j/k", "navigate"),
        row("Enter", "open session"),
        row("/", "search sessions"),
        row("r", "refresh"),
        Line::raw(""),
        Line::from(Span::styled(" Session detail", section)),
        row("j/k", "next/previous turn"),
        row("Enter", "raw message payload"),
        row("/", "filter transcript"),
        row("Esc", "clear filter / back"),
        Line::raw(""),
        Line::from(Span::styled(" Global", section)),
        row("1/2", "switch tab"),
        row("?", "toggle help"),
        row("q", "quit"),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(Theme::block_accent().title(" help ")),
        popup,
    );
}

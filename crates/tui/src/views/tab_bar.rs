use crate::app::{Tab, View};
use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, active: &Tab, view: &View, area: Rect) {
    let tabs = [
        (Tab::Sessions, "1:Sessions", "Sessions"),
        (Tab::Usage, "2:Usage", "Usage"),
    ];

    // In the detail view number keys are unavailable, so hide the prefixes.
    let hide_numbers = matches!(view, View::SessionDetail);

    let mut spans = vec![Span::styled(" ", Style::new())];

    for (tab, label_numbered, label_plain) in &tabs {
        let is_active = tab == active;
        let label = if hide_numbers {
            label_plain
        } else {
            label_numbered
        };
        let style = if is_active {
            Style::new()
                .fg(Color::Black)
                .bg(Theme::ACCENT_BLUE)
                .bold()
                .add_modifier(Modifier::UNDERLINED)
        } else if hide_numbers {
            Style::new().fg(Theme::TAB_DIM)
        } else {
            Style::new().fg(Theme::TAB_INACTIVE)
        };

        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::styled(" ", Style::new()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

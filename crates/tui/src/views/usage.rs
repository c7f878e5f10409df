use crate::app::App;
use crate::theme::Theme;
use loupe_api::DailyUsagePoint;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const BAR_WIDTH: usize = 30;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(usage) = &app.usage else {
        let msg = if app.usage_loading {
            "Loading usage..."
        } else {
            "No usage data."
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

    let [current_area, previous_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    // Shared scale across both weeks so the bars are comparable.
    let max_total = usage
        .current_week
        .iter()
        .chain(&usage.previous_week)
        .map(|p| p.cumulative_total)
        .max()
        .unwrap_or(0)
        .max(1);

    render_week(
        frame,
        " this week ",
        &usage.current_week,
        max_total,
        Theme::ACCENT_BLUE,
        current_area,
    );
    render_week(
        frame,
        " last week ",
        &usage.previous_week,
        max_total,
        Theme::BAR_DIM,
        previous_area,
    );
}

fn render_week(
    frame: &mut Frame,
    title: &str,
    week: &[DailyUsagePoint],
    max_total: u64,
    color: Color,
    area: Rect,
) {
    let block = Theme::block_dim().title(title.to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = week
        .iter()
        .map(|point| {
            let filled = bar_cells(point.cumulative_total, max_total, BAR_WIDTH);
            Line::from(vec![
                Span::styled(
                    format!(" {:<4}", point.weekday),
                    Style::new().fg(Theme::TEXT_SECONDARY),
                ),
                Span::styled("█".repeat(filled), Style::new().fg(color)),
                Span::styled(
                    "░".repeat(BAR_WIDTH - filled),
                    Style::new().fg(Theme::TEXT_MUTED),
                ),
                Span::styled(
                    format!(" {}", point.cumulative_total),
                    Style::new().fg(Theme::TEXT_PRIMARY),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Number of filled bar cells; nonzero totals always show at least one.
fn bar_cells(total: u64, max_total: u64, width: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (((total as f64 / max_total as f64) * width as f64) as usize).clamp(1, width)
}

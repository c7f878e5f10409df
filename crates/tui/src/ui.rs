use crate::app::{App, FlashLevel, View};
use crate::theme::Theme;
use crate::views::{help, session_detail, session_list, tab_bar, usage};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &mut App) {
    let [tab_area, header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    tab_bar::render(frame, &app.active_tab, &app.view, tab_area);
    render_header(frame, app, header_area);

    match app.view {
        View::SessionList => session_list::render(frame, app, body_area),
        View::SessionDetail => session_detail::render(frame, app, body_area),
        View::Usage => usage::render(frame, app, body_area),
        View::Help => {} // rendered as overlay below
    }

    render_footer(frame, app, footer_area);

    if matches!(app.view, View::Help) {
        help::render(frame, frame.area());
    }
    if app.raw_popup.is_some() {
        session_detail::render_raw_popup(frame, app);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(
        " loupe ",
        Style::new().fg(Theme::ACCENT_ORANGE).bold(),
    )];

    match app.view {
        View::SessionDetail => {
            if let Some(view) = &app.detail {
                spans.push(Span::styled(
                    format!(" {} ", view.session_id),
                    Style::new().fg(Theme::TEXT_PRIMARY),
                ));
                spans.push(Span::styled(
                    format!("  {} turns · {} messages", view.turns.len(), view.messages.len()),
                    Style::new().fg(Theme::TEXT_SECONDARY),
                ));
            } else if app.detail_loading {
                spans.push(Span::styled(
                    "Loading...",
                    Style::new().fg(Theme::ACCENT_YELLOW).italic(),
                ));
            }
        }
        View::Usage => {
            spans.push(Span::styled(
                " daily usage ",
                Style::new().fg(Theme::TEXT_PRIMARY),
            ));
        }
        _ => {
            if app.loading_sessions {
                spans.push(Span::styled(
                    "Loading...",
                    Style::new().fg(Theme::ACCENT_YELLOW).italic(),
                ));
            } else {
                spans.push(Span::styled(
                    format!("{} sessions", app.filtered_sessions.len()),
                    Style::new().fg(Theme::TEXT_SECONDARY),
                ));
                if app.session_matches.is_some() {
                    spans.push(Span::styled(
                        format!("  filter: {}", app.session_search.query.trim()),
                        Style::new().fg(Theme::ACCENT_YELLOW),
                    ));
                }
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    // Flash messages take the whole footer until the next key press.
    if let Some((msg, level)) = &app.flash_message {
        let color = match level {
            FlashLevel::Info => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {msg}"),
                Style::new().fg(color),
            ))),
            area,
        );
        return;
    }

    let search = if app.session_search.active {
        Some(&app.session_search)
    } else if app.message_search.active {
        Some(&app.message_search)
    } else {
        None
    };

    let help = if let Some(search) = search {
        Line::from(vec![
            Span::styled(
                " / ",
                Style::new()
                    .fg(Color::Black)
                    .bg(Theme::ACCENT_YELLOW)
                    .bold(),
            ),
            Span::styled(
                format!(" {}", search.query),
                Style::new().fg(Theme::TEXT_PRIMARY),
            ),
            Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)),
            Span::styled("  ESC cancel  Enter confirm", desc_style),
        ])
    } else {
        match app.view {
            View::SessionList => Line::from(vec![
                Span::styled(" j/k ", key_style),
                Span::styled("navigate  ", desc_style),
                Span::styled("Enter ", key_style),
                Span::styled("open  ", desc_style),
                Span::styled("/ ", key_style),
                Span::styled("search  ", desc_style),
                Span::styled("r ", key_style),
                Span::styled("refresh  ", desc_style),
                Span::styled("? ", key_style),
                Span::styled("help  ", desc_style),
                Span::styled("q ", key_style),
                Span::styled("quit", desc_style),
            ]),
            View::SessionDetail => Line::from(vec![
                Span::styled(" j/k ", key_style),
                Span::styled("turn  ", desc_style),
                Span::styled("g/G ", key_style),
                Span::styled("first/last  ", desc_style),
                Span::styled("Enter ", key_style),
                Span::styled("raw  ", desc_style),
                Span::styled("/ ", key_style),
                Span::styled("filter  ", desc_style),
                Span::styled("Esc ", key_style),
                Span::styled("back", desc_style),
            ]),
            View::Usage => Line::from(vec![
                Span::styled(" r ", key_style),
                Span::styled("refresh  ", desc_style),
                Span::styled("Esc ", key_style),
                Span::styled("back", desc_style),
            ]),
            View::Help => Line::from(Span::styled(" any key to close", desc_style)),
        }
    };

    frame.render_widget(Paragraph::new(help), area);
}

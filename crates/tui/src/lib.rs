mod app;
mod async_ops;
mod config;
mod logging;
mod theme;
mod ui;
mod views;

use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use app::App;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Server URL override from the command line.
    pub server_url: Option<String>,
}

/// Launch the TUI against the configured (or overridden) server.
pub fn run(options: RunOptions) -> Result<()> {
    let mut config = config::load_config();
    if let Some(url) = options.server_url {
        config.server.url = url.trim_end_matches('/').to_string();
    }
    let _log_guard = logging::init(&config.logging.level)?;

    let mut app = App::new(config);
    app.loading_sessions = true;
    app.pending_commands
        .push(async_ops::AsyncCommand::FetchSessions);

    // Terminal setup — show UI immediately, data loads in the background
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let (tx, result_rx) = mpsc::channel::<async_ops::CommandResult>();

    loop {
        // ── Drain results from in-flight commands ─────────────────────
        while let Ok(result) = result_rx.try_recv() {
            app.apply_command_result(result);
        }

        // ── Fire due debounce timers, dispatch generated commands ─────
        app.tick(Instant::now());
        for cmd in app.take_commands() {
            let tx = tx.clone();
            let config = app.config.clone();
            // In-flight commands are never cancelled; superseded responses
            // are discarded by generation when they arrive.
            rt.spawn(async move {
                let _ = tx.send(async_ops::execute(cmd, &config).await);
            });
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) {
                    break;
                }
            }
        }
    }
    Ok(())
}

use loupe_core::timeline::EventKind;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};

pub struct Theme;

impl Theme {
    // ── Background ───────────────────────────────────────────────────
    pub const BG_SURFACE: Color = Color::Rgb(30, 35, 50);

    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(100, 180, 240);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);
    pub const ACCENT_ORANGE: Color = Color::Rgb(217, 119, 80);
    pub const ACCENT_CYAN: Color = Color::Rgb(80, 200, 200);

    // ── Role colors ──────────────────────────────────────────────────
    pub const ROLE_USER: Color = Color::Rgb(80, 180, 100);
    pub const ROLE_AGENT: Color = Color::Rgb(100, 140, 220);

    // ── Detail view colors ───────────────────────────────────────────
    pub const BAR_DIM: Color = Color::Rgb(70, 75, 90);

    // ── Tab style ────────────────────────────────────────────────────
    pub const TAB_INACTIVE: Color = Color::Rgb(120, 125, 140);
    pub const TAB_DIM: Color = Color::Rgb(70, 75, 90);

    // ── Padding ──────────────────────────────────────────────────────
    pub const PADDING_CARD: Padding = Padding::new(2, 2, 1, 1);

    // ── Block helpers ────────────────────────────────────────────────

    pub fn block() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_NORMAL))
    }

    pub fn block_dim() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_DIM))
    }

    pub fn block_accent() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_ACCENT))
    }
}

// ── Activity strip colors ────────────────────────────────────────────
//
// The layout engine emits geometry only; the kind-to-style mapping lives
// here and is applied at draw time.

pub fn event_color(kind: EventKind) -> Color {
    match kind {
        EventKind::User => Theme::ROLE_USER,
        EventKind::Ai => Theme::ROLE_AGENT,
        EventKind::Tool => Theme::ACCENT_YELLOW,
    }
}

// ── Tool icon ────────────────────────────────────────────────────────

pub fn tool_icon(tool: &str) -> &'static str {
    match tool {
        "Bash" => "$",
        "Read" => "R",
        "Write" => "W",
        "Edit" => "E",
        "Grep" | "Glob" => "/",
        "WebSearch" | "WebFetch" => "@",
        _ => "*",
    }
}

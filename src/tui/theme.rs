//! Color theme for the TUI - ANSI colors for terminal compatibility

use ratatui::style::{Color, Modifier, Style};

/// Theme using ANSI colors that work well across terminal themes
pub struct Theme;

impl Theme {
    pub const CYAN: Color = Color::Cyan;
    pub const GREEN: Color = Color::Green;
    pub const YELLOW: Color = Color::Yellow;
    pub const MAGENTA: Color = Color::Magenta;
    pub const DARK_GRAY: Color = Color::DarkGray;

    // Semantic styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::CYAN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default()
    }

    pub fn dim() -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::GREEN)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::YELLOW)
    }

    pub fn accent() -> Style {
        Style::default().fg(Self::CYAN)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::CYAN)
    }

    // Badge styles
    pub fn user_badge() -> Style {
        Style::default()
            .bg(Self::CYAN)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    pub fn assistant_badge() -> Style {
        Style::default()
            .bg(Self::MAGENTA)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    // Key hints
    pub fn key() -> Style {
        Style::default()
            .fg(Self::CYAN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key_desc() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }
}

//! Palette and semantic styling for the dashboard.

use opsdeck_core::Placeholder;
use opsdeck_core::convert::Health;
use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Panel border.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Border of a full-screen detail view.
pub fn border_detail() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

/// Product name in the header.
pub fn brand() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .add_modifier(Modifier::BOLD)
}

/// `[GitHub]`-style source label inside a panel.
pub fn source_label() -> Style {
    Style::default()
        .fg(ELECTRIC_YELLOW)
        .add_modifier(Modifier::BOLD)
}

/// Normal content text.
pub fn text() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Header row 2 when it carries a status message.
pub fn status_message() -> Style {
    Style::default().fg(ELECTRIC_YELLOW)
}

/// Key hint text (e.g., "q quit").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Colour for a status glyph.
pub fn health_style(health: Health) -> Style {
    let fg = match health {
        Health::Good => SUCCESS_GREEN,
        Health::Bad => ERROR_RED,
        Health::Busy => ELECTRIC_YELLOW,
        Health::Stopped | Health::Unknown => BORDER_GRAY,
    };
    Style::default().fg(fg)
}

/// Style of one converted line: its leading glyph decides, plain text
/// otherwise.
pub fn line_style(line: &str) -> Style {
    Health::of_line(line).map_or_else(text, health_style)
}

/// Style of a source that produced no lines this cycle.
pub fn placeholder_style(placeholder: &Placeholder) -> Style {
    let fg = match placeholder {
        Placeholder::NotConfigured { .. } => BORDER_GRAY,
        Placeholder::Failed { .. } | Placeholder::TimedOut { .. } => ERROR_RED,
        Placeholder::Busy { .. } => ELECTRIC_YELLOW,
    };
    Style::default().fg(fg)
}

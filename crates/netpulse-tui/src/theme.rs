//! Dashboard palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

use netpulse_core::{NotificationLevel, Severity, SyncPhase};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29
pub const LIGHT_BLUE: Color = Color::Rgb(139, 233, 253); // #8be9fd

/// Line colors for the CPU, memory and packet-loss charts, in that order.
pub const METRIC_SERIES: [Color; 3] = [LIGHT_BLUE, SUCCESS_GREEN, CORAL];

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(NEON_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Row under the alert cursor.
pub fn table_selected() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Selected device in the device bar.
pub fn tab_active() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Badge color for an alert severity. Only `high` and above stand out.
pub fn severity(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD),
        Severity::High => Style::default().fg(ERROR_RED),
        Severity::Warning => Style::default().fg(ELECTRIC_YELLOW),
        Severity::Info | Severity::Unknown => Style::default().fg(LIGHT_BLUE),
    }
}

pub fn phase(phase: SyncPhase) -> Style {
    match phase {
        SyncPhase::Idle => Style::default().fg(BORDER_GRAY),
        SyncPhase::Loading => Style::default().fg(ELECTRIC_YELLOW),
        SyncPhase::Ready => Style::default().fg(SUCCESS_GREEN),
    }
}

pub fn notification(level: NotificationLevel) -> Style {
    match level {
        NotificationLevel::Info => Style::default().fg(NEON_CYAN),
        NotificationLevel::Warning => Style::default().fg(ELECTRIC_YELLOW),
        NotificationLevel::Error => Style::default().fg(ERROR_RED),
    }
}

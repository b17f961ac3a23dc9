/*!
 * Homewatch CLI Style System
 *
 * Styling utilities for the terminal front end: sensor tables, history
 * listings and themed messages.
 */

use chrono::{DateTime, Local, Utc};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};
use homewatch_core_sensors::{ConnectivityState, HistoryEntry, HistoryKind, SensorStatus};
use homewatch_sentinel::{EngineView, PollStats};

// ============================================================================
// THEME COLORS
// ============================================================================

/// Colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    /// Success color (green)
    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    /// Warning color (yellow)
    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    /// Error color (red)
    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }

    /// Alarm banner (bold white on red)
    pub fn alarm<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).white().on_red().bold()
    }
}

// ============================================================================
// ICONS
// ============================================================================

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const PENDING: &'static str = "○";
    pub const CONNECTED: &'static str = "●";

    pub const HOME: &'static str = "🏠";
    pub const SIREN: &'static str = "🚨";
    pub const BELL_OFF: &'static str = "🔕";
    pub const VIBRATE: &'static str = "📳";
    pub const SATELLITE: &'static str = "🛰";
    pub const CLOCK: &'static str = "⏱";

    pub const ARROW_RIGHT: &'static str = "→";
    pub const BULLET: &'static str = "•";
}

// ============================================================================
// SECTIONS
// ============================================================================

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// One row per sensor: name, status and when it last alerted
pub fn sensor_table(view: &EngineView) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Sensor"),
        header_cell("Status"),
        header_cell("Last alert"),
    ]);

    for (id, status) in view.snapshot.iter() {
        let last_alert = view
            .last_alerts
            .get(id)
            .map(|at| format_timestamp(*at))
            .unwrap_or_else(|| "No alerts".to_string());

        table.add_row(vec![
            Cell::new(id.display_name()),
            status_cell(status),
            Cell::new(last_alert).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Newest-first history listing
pub fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Time"),
        header_cell("Event"),
        header_cell("Details"),
    ]);

    for entry in entries {
        let kind = Cell::new(history_label(entry.kind));
        let kind = match entry.kind {
            HistoryKind::AlarmRaised | HistoryKind::ResetFailed | HistoryKind::ConnectionLost => {
                kind.fg(Color::Red)
            }
            HistoryKind::AlarmCleared | HistoryKind::ConnectionRestored => kind.fg(Color::Green),
            HistoryKind::Dismissed => kind.fg(Color::Yellow),
        };

        table.add_row(vec![
            Cell::new(format_timestamp(entry.timestamp)),
            kind,
            Cell::new(&entry.message),
        ]);
    }

    table
}

/// Create a key-value table for stats
pub fn stats_table(stats: &PollStats) -> Table {
    let items = [
        ("Polls", stats.total_passes().to_string()),
        (
            "Succeeded",
            format!(
                "{} ({:.1}%)",
                stats.passes_applied,
                stats.success_ratio() * 100.0
            ),
        ),
        ("Failed", stats.passes_failed.to_string()),
        ("Discarded", stats.passes_discarded.to_string()),
        ("Alarms raised", stats.alarms_raised.to_string()),
        ("Dismissals", stats.dismissals.to_string()),
        ("Reset failures", stats.reset_failures.to_string()),
    ];

    let mut table = create_minimal_table();
    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn status_cell(status: SensorStatus) -> Cell {
    match status {
        SensorStatus::Alert => Cell::new(format!("{} ALERT", Icons::SIREN))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        SensorStatus::Ok => Cell::new(format!("{} OK", Icons::SUCCESS)).fg(Color::Green),
        SensorStatus::Unknown => {
            Cell::new(format!("{} Unknown", Icons::PENDING)).fg(Color::DarkGrey)
        }
    }
}

fn history_label(kind: HistoryKind) -> &'static str {
    match kind {
        HistoryKind::AlarmRaised => "Alarm",
        HistoryKind::AlarmCleared => "Cleared",
        HistoryKind::Dismissed => "Dismissed",
        HistoryKind::ResetFailed => "Reset failed",
        HistoryKind::ConnectionLost => "Disconnected",
        HistoryKind::ConnectionRestored => "Reconnected",
    }
}

/// Local wall-clock rendering of a timestamp
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One-line connection summary
pub fn connection_line(view: &EngineView) -> String {
    match view.connectivity {
        ConnectivityState::Connected => {
            let stamp = view
                .source_updated
                .as_deref()
                .map(|s| format!(" (source updated {})", s))
                .unwrap_or_default();
            format!(
                "{} {}{}",
                Theme::success(Icons::CONNECTED),
                Theme::success("Connected"),
                Theme::muted(stamp)
            )
        }
        ConnectivityState::Disconnected => {
            let reason = view
                .last_error
                .as_deref()
                .map(|e| format!(": {}", e))
                .unwrap_or_default();
            format!(
                "{} {}{}",
                Theme::error(Icons::PENDING),
                Theme::error("Disconnected"),
                Theme::muted(reason)
            )
        }
    }
}

/// Alarm banner line, or an all-clear line
pub fn alarm_line(view: &EngineView) -> String {
    if view.alarm_active() {
        let names: Vec<&str> = view.alarms.iter().map(|id| id.display_name()).collect();
        let vibration = if view.engaged {
            format!(" {}", Icons::VIBRATE)
        } else {
            String::new()
        };
        format!(
            "{}{}",
            Theme::alarm(format!(" {} ALARM: {} ", Icons::SIREN, names.join(", "))),
            vibration
        )
    } else {
        format!(
            "{} {}",
            Theme::success(Icons::SUCCESS),
            Theme::success("All sensors normal")
        )
    }
}

/// Format duration into human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours, mins)
    }
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

// ============================================================================
// BANNER
// ============================================================================

/// Print the Homewatch banner
pub fn print_banner(endpoint: &str) {
    let version = env!("CARGO_PKG_VERSION");

    println!();
    println!(
        "  {} {} {}",
        Icons::HOME,
        Theme::header("H O M E W A T C H"),
        Theme::muted(format!("v{}", version))
    );
    println!(
        "  {} {}",
        Theme::muted(Icons::SATELLITE),
        Theme::muted(format!("Watching {}", endpoint))
    );
    println!(
        "  {}",
        Theme::muted("[d] dismiss  [r] refresh  [h] history  [s] stats  [q] quit")
    );
    println!();
}

// ============================================================================
// TESTS
// ============================================================================

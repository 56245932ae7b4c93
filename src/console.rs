//! Status output with ANSI color support.
//!
//! Everything is written to stderr so report tables on stdout can be piped.
//! Colors follow TTY detection and the NO_COLOR environment variable.

use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Status line printer with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console, enabling colors only when stderr is a terminal
    /// and `NO_COLOR` is unset.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stderr().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn step(&self, message: &str) {
        eprintln!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        eprintln!();
        eprintln!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Formats a table name with its row count, e.g. `overall (42 rows)`.
    pub fn table_summary(&self, name: &str, rows: usize) -> String {
        let unit = if rows == 1 { "row" } else { "rows" };
        format!(
            "{} {}",
            self.style(name, &[Style::Bold]),
            self.style(&format!("({} {})", rows, unit), &[Style::Dim])
        )
    }
}

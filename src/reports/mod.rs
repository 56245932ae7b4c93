//! Report row types and the transforms that produce them.
//!
//! Each submodule pairs the raw payload shapes of one set of endpoints with
//! the pure transform into typed rows. The network side lives on
//! [`crate::Client`].

pub mod events;
pub mod roster;
pub mod standings;

pub use events::{EventDescriptor, EventResult};
pub use roster::{Grade, RosterRow};
pub use standings::{GcStanding, LeagueStandings, SyntheticTime, TeamStanding};

/// A row that can be laid out in a fixed set of named columns.
pub trait Tabular {
    /// Column headers, in output order.
    fn headers() -> &'static [&'static str];

    /// One rendered cell per header.
    fn cells(&self) -> Vec<String>;
}

/// Renders rows as tab-separated text with a header line.
///
/// Tabs and newlines inside cells are replaced by spaces.
pub fn render_tsv<T: Tabular>(rows: &[T]) -> String {
    let mut out = T::headers().join("\t");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row
            .cells()
            .into_iter()
            .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// Formats an optional number, leaving missing values blank.
pub(crate) fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

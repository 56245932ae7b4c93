//! Tracing subscriber setup for the command-line tool.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the log filter: `RUST_LOG` when set, otherwise warnings only, or
/// debug output for this crate when `verbose` is on.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default_directive = if verbose {
        "zwiftpower=debug"
    } else {
        "zwiftpower=warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs a stderr subscriber so reports on stdout stay machine-readable.
pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter(verbose)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_filter_levels() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter(false).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(true).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}

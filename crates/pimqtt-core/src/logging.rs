//! `tracing` subscriber setup.
//!
//! The daemon logs human-readable, compact lines to stderr. Filter
//! precedence: `RUST_LOG` when set, otherwise the level passed in (from
//! the CLI or the settings file).

use tracing_subscriber::EnvFilter;

/// Default filter when nothing else is configured.
pub const DEFAULT_LEVEL: &str = "info";

/// Build the filter for `level`, letting `RUST_LOG` win when present.
///
/// An unparseable `level` falls back to [`DEFAULT_LEVEL`].
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at startup. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails only if a global subscriber is already set
    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber("warn");
        init_subscriber("debug");
    }

    #[test]
    fn invalid_level_falls_back() {
        // Must not panic on garbage input.
        let _filter = build_filter("not a [valid filter");
    }
}

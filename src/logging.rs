//! Logging setup.
//!
//! Filter directives come from the `FOLIO_LOG` environment variable and
//! default to `info`:
//!
//! ```bash
//! FOLIO_LOG=debug folio gallery rows.json
//! FOLIO_LOG=folio::media=debug,warn folio layout --dir ./photos
//! ```
//!
//! Logs go to stderr; stdout carries the JSON and CSS the commands print.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "FOLIO_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_filter_directives_parse() {
        for directive in ["info", "debug", "warn", "folio::media=debug,warn"] {
            assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        super::init();
        super::init();
    }
}

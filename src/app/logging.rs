//! Tracing setup for the faultline binary
//!
//! Logs go to stderr so stdout carries only reports. `RUST_LOG`, when set,
//! replaces the filter derived from `-v` counts.

use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use crate::app::config::AppConfig;

/// Filter directives: `RUST_LOG` wins over the verbosity ladder
fn filter_directives(config: &AppConfig, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => config.log_level().to_string(),
    }
}

/// Install the global subscriber; call once at startup
pub fn init_logging(config: &AppConfig) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(config, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2)
        .with_thread_ids(config.verbose >= 3)
        .with_line_number(config.verbose >= 3)
        .init();

    debug!("Logging at '{}' (verbosity {})", directives, config.verbose);
    trace!("Arguments: {:?}", std::env::args().collect::<Vec<_>>());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_ladder_without_env() {
        assert_eq!(filter_directives(&AppConfig::new(0), None), "info");
        assert_eq!(filter_directives(&AppConfig::new(2), None), "trace");
    }

    #[test]
    fn test_rust_log_overrides_ladder() {
        assert_eq!(
            filter_directives(&AppConfig::new(0), Some("faultline=debug")),
            "faultline=debug"
        );
        assert_eq!(filter_directives(&AppConfig::new(1), Some("  ")), "debug");
    }
}

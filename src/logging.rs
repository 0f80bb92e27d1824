//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. an explicit level (CLI flag or `[logging].level`)
//! 2. `EVENT_SCHEDULE_LOG` environment variable (e.g. "info", "event_schedule=debug")
//! 3. default to `info`

use tracing_subscriber::EnvFilter;

use crate::config::ENV_LOG;

pub type LoggingResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Initialise the global subscriber. Fails if one is already installed.
pub fn init_logging(level: Option<&str>) -> LoggingResult {
    let env_value = std::env::var(ENV_LOG).ok();
    let directive = filter_directive(level, env_value.as_deref());
    let filter = EnvFilter::try_new(&directive)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
}

pub fn filter_directive<'a>(explicit: Option<&'a str>, env_value: Option<&'a str>) -> String {
    let non_blank = |value: Option<&'a str>| value.map(str::trim).filter(|s| !s.is_empty());
    non_blank(explicit)
        .or_else(|| non_blank(env_value))
        .map(|s| match s.to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            _ => s.to_string(),
        })
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins() {
        assert_eq!(filter_directive(Some("debug"), Some("error")), "debug");
        assert_eq!(filter_directive(None, Some("error")), "error");
        assert_eq!(filter_directive(None, None), "info");
        assert_eq!(filter_directive(Some("  "), None), "info");
        assert_eq!(filter_directive(Some("Warning"), None), "warn");
    }

    #[test]
    fn blank_explicit_level_falls_back_to_env() {
        assert_eq!(filter_directive(Some("  "), Some("debug")), "debug");
        assert_eq!(filter_directive(Some(""), Some(" trace ")), "trace");
        assert_eq!(filter_directive(Some(" "), Some(" ")), "info");
    }
}

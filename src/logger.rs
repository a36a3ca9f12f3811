//! Logging initialisation via tracing-subscriber.
//!
//! [`resolve`] picks the effective filter from the CLI flag and the
//! configured level; [`init`] installs the global subscriber once.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Effective log filter and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings<'a> {
    /// Level string or `EnvFilter` directive.
    pub level: &'a str,
    /// `true` when the level was forced on the command line and must win
    /// over `RUST_LOG`.
    pub forced: bool,
}

/// A CLI level beats `RUST_LOG`; otherwise `RUST_LOG` beats the configured
/// level. The CLI level is validated up front.
pub fn resolve<'a>(cli_level: Option<&'a str>, configured: &'a str) -> Result<LogSettings<'a>, AppError> {
    match cli_level {
        Some(level) => {
            parse_level(level)?;
            Ok(LogSettings { level, forced: true })
        }
        None => Ok(LogSettings { level: configured, forced: false }),
    }
}

/// Install the global subscriber, writing to stderr.
pub fn init(settings: &LogSettings<'_>) -> Result<(), AppError> {
    let level = settings.level;
    let filter = if settings.forced {
        EnvFilter::try_new(level)
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Parse a plain level name into a [`LevelFilter`].
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_levels_parse() {
        for l in &["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
    }

    #[test]
    fn invalid_level_errors() {
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn cli_level_is_forced() {
        let s = resolve(Some("debug"), "info").unwrap();
        assert_eq!(s, LogSettings { level: "debug", forced: true });
    }

    #[test]
    fn configured_level_is_a_fallback() {
        let s = resolve(None, "tower_http=debug,info").unwrap();
        assert_eq!(s, LogSettings { level: "tower_http=debug,info", forced: false });
    }

    #[test]
    fn bad_cli_level_is_rejected() {
        assert!(resolve(Some("loud"), "info").is_err());
    }

    #[test]
    fn init_succeeds_or_already_init() {
        // Another test in this process may have installed a subscriber first.
        match init(&LogSettings { level: "info", forced: false }) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}

//! Logging Setup
//!
//! Shared `env_logger` configuration of the command-line tools. Warnings
//! and errors are prefixed with their level, everything else is printed
//! as is. `RUST_LOG` overrides the default level.

use std::io::Write;

use log::Level;

/// Default filter for the given verbosity.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Renders a log line the way the tools print it.
pub fn format_line(level: Level, message: &str) -> String {
    match level {
        Level::Warn | Level::Error => format!("[{}] {}", level, message),
        _ => message.to_string(),
    }
}

/// Configures the logging system with appropriate formatting.
pub fn setup_logging(verbose: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter(verbose)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(record.level(), &record.args().to_string())
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(Level::Warn, "disk low"), "[WARN] disk low");
        assert_eq!(format_line(Level::Error, "failed"), "[ERROR] failed");
        assert_eq!(format_line(Level::Info, "submitted"), "submitted");
    }
}

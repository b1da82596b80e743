//! Process configuration

use std::path::PathBuf;

use clap::Parser;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Promo enrollment service configuration
#[derive(Debug, Parser)]
#[command(
    name = "promo-enrollment-service",
    about = "Promo and enrollment use cases over JSON lines",
    long_about = None
)]
pub struct Config {
    /// Log level or filter directives (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// JSON file holding the members to serve enrollments for
    #[arg(short, long, env = "PROMO_MEMBERS_FILE")]
    pub members: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["promo-enrollment-service"]);

        assert_that!(config).is_ok().matches(|config| {
            config.log_format == LogFormat::Compact && config.members.is_none()
        });
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "promo-enrollment-service",
            "--log-format",
            "json",
            "--members",
            "members.json",
            "--log-level",
            "debug",
        ]);

        assert_that!(config).is_ok().matches(|config| {
            config.log_format == LogFormat::Json
                && config.log_level == "debug"
                && config.members.as_deref() == Some(std::path::Path::new("members.json"))
        });
    }
}

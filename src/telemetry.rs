//! Logging subscriber initialisation.

use tracing_subscriber::{filter::ParseError, util::TryInitError, EnvFilter};

use crate::config::{Config, LogFormat};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid log level/filter '{value}'")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },

    #[error("telemetry error: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level when both are set. Logs go to stderr, stdout is
/// reserved for replies.
pub fn init(config: &Config) -> Result<(), Error> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|source| Error::EnvFilter {
            value: config.log_level.clone(),
            source,
        })?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

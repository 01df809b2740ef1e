//! Tracing subscriber for the command-line binary.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber, writing to stderr. `RUST_LOG` overrides `config.level`.
///
/// Later calls leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_ignored() {
        let config = LoggingConfig {
            level: "warn".to_owned(),
            json: true,
        };
        init_logging(&config);
        init_logging(&LoggingConfig::default());
        tracing::warn!("still logging");
    }
}

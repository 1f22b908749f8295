//! Tracing subscriber setup shared by the binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Directives used when `RUST_LOG` is unset
pub fn default_filter(config: &LoggingConfig) -> String {
    format!("postsync={},tower_http=debug", config.level)
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level from `config`. A `json` format prints
/// JSON lines; anything else prints the pretty format.
pub fn init(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(config).into());

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

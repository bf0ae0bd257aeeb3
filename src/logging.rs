//! Tracing subscriber setup shared by both binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("blockwatch={},tower_http=debug", level)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level;
/// `format = "json"` selects structured output.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format.as_str() {
        "json" => registry.with(fmt::layer().json()).try_init(),
        _ => registry.with(fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

//! Logging initialization
//!
//! Sets up the tracing subscriber from application settings. The filter
//! honors `RUST_LOG` when present and falls back to the configured log level.

use crate::config::Settings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before any pool operations run. Subsequent calls
/// return an error from the underlying subscriber registry, which is ignored
/// so embedding applications that install their own subscriber keep it.
pub fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let console_layer = if settings.log_json {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_filter(filter).boxed()
    };

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}

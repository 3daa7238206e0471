use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "REPORTGEN_LOG";
pub const DEFAULT_DIRECTIVE: &str = "info";

static INIT_LOGGING: Once = Once::new();

#[must_use]
pub fn resolve_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);

        let installed = tracing_subscriber::registry()
            .with(resolve_filter())
            .with(stderr_layer)
            .try_init();
        if let Err(error) = installed {
            eprintln!("reportgen: logging already initialized: {error}");
        }
    });
}

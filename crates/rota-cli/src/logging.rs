use std::env;

use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so stdout stays pure JSON.
///
/// The filter comes from `ROTA_LOG` (e.g. `debug`, `rota_engine=info`), default `warn`.
pub fn init_logger() {
    let filter = env::var("ROTA_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter_layer = EnvFilter::new(filter);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    debug!("Tracing is configured for stderr logging.");
}

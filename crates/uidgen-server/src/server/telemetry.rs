//! Structured logging for the server.
//!
//! Events go to stdout through a `tracing_subscriber::fmt` layer, filtered by
//! `RUST_LOG` (default `info`). Request spans come from `tower_http`'s
//! `TraceLayer`, so `RUST_LOG=tower_http=debug` shows one span per request.
//!
//! ```bash
//! RUST_LOG=uidgen=trace,tower_http=debug uidgen-server --log-format json
//! ```

use crate::server::config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .with_file(true)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_thread_ids(true)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .json(),
            )
            .try_init()?,
    }

    Ok(())
}

//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Reads `REVCYCLE_LOG` for per-module levels, e.g.
/// `REVCYCLE_LOG=revcycle_storage=debug,revcycle_core=warn`.
/// Falls back to `revcycle=info` when unset or invalid.
///
/// Idempotent; later calls are no-ops. A subscriber installed by the host
/// application first is left in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("REVCYCLE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("revcycle=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging.
///
/// Reads `QUINIELA_LOG` for per-module levels, e.g.
/// `QUINIELA_LOG=quiniela_analysis=debug,quiniela_storage=warn`.
/// Falls back to `quiniela=info` when unset or invalid. Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("QUINIELA_LOG")
            .unwrap_or_else(|_| EnvFilter::new("quiniela=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}

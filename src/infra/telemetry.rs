//! Tracing initialisation for the `ci-matrix` binary.
//!
//! User-facing progress goes to stdout through localized messages; the
//! diagnostic events emitted with `tracing` go to stderr and are silent
//! unless enabled through `CI_MATRIX_LOG` (e.g. `CI_MATRIX_LOG=debug`).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV: &str = "CI_MATRIX_LOG";

/// Initialise the global tracing subscriber. Only the first call takes effect.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

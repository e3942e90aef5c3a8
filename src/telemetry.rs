//! Log output for the release run
//!
//! Text logs go to the job log without timestamps because the runner adds
//! its own. `--json-logs` switches to one JSON object per line.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the process-wide subscriber
///
/// `RUST_LOG` takes precedence over `level`. A subscriber that is already
/// installed is left alone, so calling this twice is harmless.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let _ = if json {
        registry.with(fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(fmt::layer().without_time().with_target(false)).try_init()
    };
}

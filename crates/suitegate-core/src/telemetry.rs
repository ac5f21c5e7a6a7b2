//! Tracing initialisation for suitegate binaries.
//!
//! Logs go to stderr; stdout is reserved for the suite report and the
//! pass-through of captured suite output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins over `level`. With `json` set, each event is one JSON
/// line. Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
        }))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .try_init()
        .ok();
}

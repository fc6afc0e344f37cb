//! Logging - tracing subscriber for native embeddings

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Filter from `RUST_LOG` (default `info`);
/// `SHADES_LOG_JSON=1` switches to JSON lines. Returns `false` when a global
/// subscriber was already installed, by this or anything else.
pub fn init_logging() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("SHADES_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    let installed = if use_json {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init()
    };
    match installed {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(reason = %e, "tracing subscriber already installed");
            false
        }
    }
}

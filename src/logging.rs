use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Default directive when `RUST_LOG` is unset: our own info logs, warnings
/// from dependencies.
pub const DEFAULT_FILTER: &str = "warn,game_collector=info";

/// Install the collector's log output. `RUST_LOG` wins when set, otherwise
/// `default_filter` applies.
///
/// Log events are written to stderr; stdout is left to the per-game progress
/// lines and the end-of-run summary.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_LEVEL: &str =
    "info,sv_lodge_backend=debug,sv_lodge_remote=debug,hyper=info,rustls=info";

/// Pretty stdout logging, filtered by `RUST_LOG` when it is set.
pub fn setup_tracing() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
        ))
        .init();
}

use once_cell::sync::Lazy;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

// This will ensure the subscriber is only installed once per process.
static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Another subscriber (e.g. tracing-test) may already be installed.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
});

/// Install the fmt subscriber, filtered by `RUST_LOG`.
pub fn enable_logger() {
    Lazy::force(&LOGGER_INIT);
}

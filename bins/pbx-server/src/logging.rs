/// Install the process-wide tracing subscriber. Respects `RUST_LOG`,
/// defaulting to `info` when unset.
pub fn setup_logging_default() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

use tracing_subscriber::EnvFilter;

/// Installs the stderr diagnostics subscriber, filtered by `RUST_LOG` (default `warn`).
///
/// Progress and summaries go to stdout through the output formatters; this only carries
/// lifecycle and failure diagnostics.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "statcard=info";

/// Installs the stderr `tracing` subscriber. `RUST_LOG` overrides the default
/// filter; `verbose` raises this crate to debug. Safe to call more than once.
pub fn init(verbose: bool) {
    let fallback = if verbose { "statcard=debug" } else { DEFAULT_DIRECTIVE };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Log output setup for the binary.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr so stdout stays clean
/// for exports. `RUST_LOG` wins unless `verbose` is set.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,fintrack=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

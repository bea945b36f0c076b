use tracing_subscriber::EnvFilter;

/// Diagnostic output on stderr. `RUST_LOG` wins over the configured level,
/// `--verbose` forces debug.
pub fn init_tracing(level: &str, verbose: bool) {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second init (tests) is not an error worth surfacing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

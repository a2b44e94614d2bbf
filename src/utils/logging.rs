use tracing_subscriber::EnvFilter;

/// Install the global subscriber for the CLI binary.
///
/// Events go to stderr so `--json` diagnostics stay machine-readable on
/// stdout. `verbose` raises this crate's own targets to debug; a
/// RUST_LOG environment filter overrides both.
pub fn init_logging(verbose: bool) {
    let modem_directive = if verbose { "hamdrm=debug" } else { "hamdrm=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(modem_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr; stdout carries only the tool's own output.
pub(crate) fn init(quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(quiet)));

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directives(quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else {
        "warn,db_ping=info,dbping_core=info,dbping_mysql=info"
    }
}

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr `fmt` subscriber. `RUST_LOG` overrides the default
/// `info` filter. Stdout is left for the report.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

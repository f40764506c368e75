mod command;
mod model;
mod util;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    command::run()
}

/// Logs go to stderr so that JSON written to stdout stays parseable.
fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install the log subscriber: {e}"))
}

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber, writing to stderr.
///
/// `verbose` forces debug level; otherwise `RUST_LOG` is honoured and
/// falls back to info.
pub fn init(verbose: bool, use_color: bool) -> Result<()> {
    let filter = mk_filter(verbose)?;
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

fn mk_filter(verbose: bool) -> Result<EnvFilter> {
    if verbose {
        return EnvFilter::try_new("debug").map_err(|e| anyhow!("Invalid log level: {}", e));
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
}

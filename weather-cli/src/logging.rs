use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for the given number of `-v` flags.
fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    format!("warn,weather_core={level},weather_tui={level}")
}

/// Log to stderr. `RUST_LOG` takes precedence over `-v`.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(verbosity > 1);

    tracing_subscriber::registry().with(filter).with(format).try_init()?;
    Ok(())
}

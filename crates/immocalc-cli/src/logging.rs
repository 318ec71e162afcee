use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = format!("immocalc={level},immocalc_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&default_filter))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init()?;

    tracing::debug!(level, "logging initialised");
    Ok(())
}

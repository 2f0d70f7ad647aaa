use crate::config::{Environment, LogLevel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JSON lines in production, human readable output locally. `RUST_LOG`
/// overrides the configured level.
pub fn setup_logging(log_level: &LogLevel, environment: &Environment) {
    let log_level = format!("{},ort=warn", log_level.as_str());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match environment {
        Environment::Production => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(false)
                        .with_level(true)
                        .with_thread_names(true),
                )
                .init();
        }
        Environment::Local => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}

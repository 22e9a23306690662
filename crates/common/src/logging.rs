use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber: pretty output in development,
/// JSON in production.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. Thread names are
/// included so lines from the acquisition thread are easy to pick out.
///
/// Returns `false` if a global subscriber was already installed.
pub fn setup_logging(environment: Environment) -> bool {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match environment {
        Environment::Production => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_thread_names(true),
            )
            .try_init(),
        Environment::Development => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    installed.is_ok()
}

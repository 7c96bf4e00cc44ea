use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};
use tracing_subscriber::{EnvFilter, Layer as _};

pub const DEFAULT_LOG_LEVEL: &str =
    "info,volunteer_console_api=debug,volunteer_console_assignment=debug,hyper=info";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter {0}")]
    Filter(#[from] ParseError),
    #[error("tracing subscriber already installed {0}")]
    Init(#[from] TryInitError),
}

/// `RUST_LOG` wins over `configured`, which wins over [`DEFAULT_LOG_LEVEL`].
pub fn env_filter(configured: Option<&str>) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_LEVEL)))
}

/// Installs a stdout fmt subscriber for the whole process. Fails if one is already installed.
pub fn setup_telemetry(configured: Option<&str>) -> Result<(), TelemetryError> {
    let stdout_log = tracing_subscriber::fmt::layer().with_filter(env_filter(configured)?);
    tracing_subscriber::registry().with(stdout_log).try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(env_filter(None).is_ok());
        assert!(env_filter(Some("warn,volunteer_console_api=trace")).is_ok());
        assert!(env_filter(Some("volunteer_console_api=loud")).is_err());
    }

    #[test]
    fn installs_once() {
        let first = setup_telemetry(Some("debug"));
        let second = setup_telemetry(Some("debug"));
        assert!(first.is_ok());
        assert!(matches!(second, Err(TelemetryError::Init(_))));
    }
}

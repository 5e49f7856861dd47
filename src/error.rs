use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failures reported by display-surface collaborators. The queuing core never
/// produces these itself; it only propagates them out of `open`.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to create display surface: {0}")]
    Create(String),
    #[error("failed to render container: {0}")]
    Container(String),
}

use thiserror::Error;

/// Stable error kinds, mirroring the policy table in the error handling design: each
/// variant carries its own retry/HTTP-status policy at the call site, never here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("Worker error: {0}")]
    WorkerError(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// The six kinds §7 dispatches HTTP status and retry policy on. `AppError` variants that
/// aren't surface-relevant (serialization, config) fold into `InternalError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Validation,
    Conflict,
    DependencyUnavailable,
    WorkerError,
    InternalError,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
            Self::WorkerError(_) => ErrorKind::WorkerError,
            Self::Database(_) | Self::Serialization(_) | Self::Config(_) | Self::InternalError(_) => {
                ErrorKind::InternalError
            }
        }
    }
}

use crate::infrastructure::config::ConfigError;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Remote call rejected: {0}")]
    Rejected(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub const EXIT_GENERIC_FAILURE: i32 = 1;
pub const EXIT_CONFIG_FAILURE: i32 = 2;
pub const EXIT_REMOTE_FAILURE: i32 = 3;
pub const EXIT_TRANSPORT_OR_AUTH_FAILURE: i32 = 4;

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::BadRequest(_) => EXIT_CONFIG_FAILURE,
            Self::NotFound(_) | Self::Rejected(_) => EXIT_REMOTE_FAILURE,
            Self::Unauthorized(_) | Self::ExternalService(_) => EXIT_TRANSPORT_OR_AUTH_FAILURE,
            Self::Internal(_) => EXIT_GENERIC_FAILURE,
        }
    }

    /// Log the error and hand back its exit code
    pub fn report(&self) -> i32 {
        let exit_code = self.exit_code();
        tracing::error!(
            error = %self,
            exit_code = exit_code,
            "Operation failed"
        );
        exit_code
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

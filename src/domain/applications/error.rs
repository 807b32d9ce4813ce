use crate::error::AppError;
use crate::infrastructure::cloud_foundry::CloudFoundryError;

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<CloudFoundryError> for ApplicationServiceError {
    fn from(err: CloudFoundryError) -> Self {
        match err {
            CloudFoundryError::NotFound { what, name } => {
                ApplicationServiceError::NotFound(format!("{} '{}'", what, name))
            }
            CloudFoundryError::Auth(e) => ApplicationServiceError::Unauthorized(e.to_string()),
            CloudFoundryError::Status { status: 401 | 403, .. } => {
                ApplicationServiceError::Unauthorized(err.to_string())
            }
            CloudFoundryError::Status { .. } => ApplicationServiceError::Rejected(err.to_string()),
            CloudFoundryError::Http(_) | CloudFoundryError::Decode(_) => {
                ApplicationServiceError::Dependency(err.to_string())
            }
        }
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(err: ApplicationServiceError) -> Self {
        match err {
            ApplicationServiceError::NotFound(msg) => AppError::NotFound(msg),
            ApplicationServiceError::Invalid(msg) => AppError::BadRequest(msg),
            ApplicationServiceError::Unauthorized(msg) => AppError::Unauthorized(msg),
            ApplicationServiceError::Rejected(msg) => AppError::Rejected(msg),
            ApplicationServiceError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}

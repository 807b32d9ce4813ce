use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("no cached refresh token and no password configured for {0}")]
    MissingCredentials(String),
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::MissingCredentials(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

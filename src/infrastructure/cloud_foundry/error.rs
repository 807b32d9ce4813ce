use crate::infrastructure::uaa::UaaError;

#[derive(Debug, thiserror::Error)]
pub enum CloudFoundryError {
    #[error("authentication failed: {0}")]
    Auth(#[from] UaaError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },
    #[error("CF API returned {status} for {method} {path}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl CloudFoundryError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Status { status: 404, .. })
    }
}

pub type CfResult<T> = Result<T, CloudFoundryError>;

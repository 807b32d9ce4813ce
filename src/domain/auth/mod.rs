pub mod error;
pub mod service;
pub mod strategy;

pub use error::AuthServiceError;
pub use service::{select_strategy, CredentialService, RefreshTokenSource};
pub use strategy::{AuthStrategy, PasswordCredentials, StrategyKind};

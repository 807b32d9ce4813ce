use super::error::AuthServiceError;
use super::strategy::{AuthStrategy, PasswordCredentials};
use crate::infrastructure::repositories::{CredentialRecord, TokenFileRepository};
use async_trait::async_trait;
use std::sync::Arc;

/// Live session that can hand back its current (possibly rotated) refresh token
#[async_trait]
pub trait RefreshTokenSource: Send + Sync {
    async fn current_refresh_token(&self) -> Option<String>;
}

/// Pick the authentication strategy for this run.
///
/// A non-empty cached refresh token always wins, even when a password is
/// also available.
pub fn select_strategy(
    cached: Option<CredentialRecord>,
    fallback: &PasswordCredentials,
) -> Result<AuthStrategy, AuthServiceError> {
    let strategy = match cached.filter(|record| !record.refresh_token.is_empty()) {
        Some(record) => AuthStrategy::RefreshToken {
            token: record.refresh_token,
        },
        None => match &fallback.password {
            Some(password) => AuthStrategy::Password {
                username: fallback.username.clone(),
                password: password.clone(),
            },
            None => {
                return Err(AuthServiceError::MissingCredentials(
                    fallback.username.clone(),
                ))
            }
        },
    };

    tracing::info!(strategy = %strategy.kind(), "Using {} for auth", strategy.kind());
    Ok(strategy)
}

pub struct CredentialService {
    token_repo: Arc<TokenFileRepository>,
}

impl CredentialService {
    pub fn new(token_repo: Arc<TokenFileRepository>) -> Self {
        Self { token_repo }
    }

    /// Read the token cache and decide how to authenticate
    pub fn select_strategy(
        &self,
        fallback: &PasswordCredentials,
    ) -> Result<AuthStrategy, AuthServiceError> {
        select_strategy(self.token_repo.read(), fallback)
    }

    /// Persist the session's refresh token for the next run.
    ///
    /// Never fails: problems are logged and reported as `false`.
    pub async fn save_refresh_token(&self, session: &dyn RefreshTokenSource) -> bool {
        let Some(refresh_token) = session
            .current_refresh_token()
            .await
            .filter(|token| !token.is_empty())
        else {
            tracing::debug!("Session holds no refresh token, nothing to cache");
            return false;
        };

        match self.token_repo.write(&CredentialRecord { refresh_token }) {
            Ok(()) => {
                tracing::info!(
                    path = %self.token_repo.path().display(),
                    "Refresh token saved"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.token_repo.path().display(),
                    error = %e,
                    "Failed to save refresh token, next run will need the password"
                );
                false
            }
        }
    }
}

use crate::domain::auth::{AuthStrategy, RefreshTokenSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Public OAuth client the cf CLI and the Java client both use
const CF_CLIENT_ID: &str = "cf";
const CF_CLIENT_SECRET: &str = "";

/// Tokens are renewed this long before they actually expire
const EXPIRY_SKEW_SECS: i64 = 30;
const DEFAULT_EXPIRES_IN_SECS: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct UaaTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UaaError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{grant} grant rejected ({status}): {body}")]
    Rejected {
        grant: &'static str,
        status: u16,
        body: String,
    },
}

struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > Utc::now()
    }
}

/// Authenticated session against a UAA token endpoint.
///
/// The first access token is obtained with the run's [`AuthStrategy`];
/// afterwards expired access tokens are renewed with the latest refresh
/// token, which UAA may rotate on every grant.
pub struct UaaSession {
    http_client: reqwest::Client,
    token_endpoint: String,
    strategy: AuthStrategy,
    state: Mutex<Option<TokenState>>,
}

impl UaaSession {
    pub fn new(
        http_client: reqwest::Client,
        token_endpoint: impl Into<String>,
        strategy: AuthStrategy,
    ) -> Self {
        Self {
            http_client,
            token_endpoint: token_endpoint.into().trim_end_matches('/').to_string(),
            strategy,
            state: Mutex::new(None),
        }
    }

    /// Current access token, running a grant first if needed
    pub async fn access_token(&self) -> Result<String, UaaError> {
        let mut state = self.state.lock().await;

        if let Some(current) = state.as_ref().filter(|s| s.is_fresh()) {
            return Ok(current.access_token.clone());
        }

        let known_refresh = state.as_ref().and_then(|s| s.refresh_token.clone());
        let response = match &known_refresh {
            Some(refresh_token) => self.refresh_grant(refresh_token).await?,
            None => match &self.strategy {
                AuthStrategy::RefreshToken { token } => self.refresh_grant(token).await?,
                AuthStrategy::Password { username, password } => {
                    self.password_grant(username, password).await?
                }
            },
        };

        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .or(known_refresh)
            .or_else(|| match &self.strategy {
                AuthStrategy::RefreshToken { token } => Some(token.clone()),
                AuthStrategy::Password { .. } => None,
            });
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        let access_token = response.access_token;
        *state = Some(TokenState {
            access_token: access_token.clone(),
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        });

        tracing::debug!(expires_in, "Access token acquired");
        Ok(access_token)
    }

    /// Force the next [`access_token`](Self::access_token) call to renew
    pub async fn invalidate(&self) {
        if let Some(current) = self.state.lock().await.as_mut() {
            current.expires_at = Utc::now();
        }
    }

    /// Refresh token held by the session, `None` before the first grant
    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_some()
    }

    async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UaaTokenResponse, UaaError> {
        tracing::debug!(username = %username, "Requesting token with password grant");
        let params = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("response_type", "token"),
        ];
        self.request_token("password", &params).await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<UaaTokenResponse, UaaError> {
        tracing::debug!("Requesting token with refresh_token grant");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("response_type", "token"),
        ];
        self.request_token("refresh_token", &params).await
    }

    async fn request_token(
        &self,
        grant: &'static str,
        params: &[(&str, &str)],
    ) -> Result<UaaTokenResponse, UaaError> {
        let response = self
            .http_client
            .post(format!("{}/oauth/token", self.token_endpoint))
            .basic_auth(CF_CLIENT_ID, Some(CF_CLIENT_SECRET))
            .header("Accept", "application/json")
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(grant, status = status.as_u16(), "Token grant rejected");
            return Err(UaaError::Rejected {
                grant,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<UaaTokenResponse>().await?)
    }
}

#[async_trait]
impl RefreshTokenSource for UaaSession {
    async fn current_refresh_token(&self) -> Option<String> {
        self.refresh_token().await
    }
}

use std::fmt;

/// Username/secret pair used when no refresh token is cached
#[derive(Clone)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How the session obtains its first token. Chosen once per run.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    RefreshToken { token: String },
    Password { username: String, password: String },
}

impl AuthStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            AuthStrategy::RefreshToken { .. } => StrategyKind::RefreshToken,
            AuthStrategy::Password { .. } => StrategyKind::Password,
        }
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::RefreshToken { .. } => f
                .debug_struct("RefreshToken")
                .field("token", &"<redacted>")
                .finish(),
            AuthStrategy::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    RefreshToken,
    Password,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::RefreshToken => write!(f, "stored refresh token"),
            StrategyKind::Password => write!(f, "password"),
        }
    }
}

pub mod error;
pub mod service;

pub use error::ApplicationServiceError;
pub use service::{ApplicationService, ApplicationServiceApi};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a push ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "app_id", rename_all = "lowercase")]
pub enum PushOutcome {
    Created(Uuid),
    Updated(Uuid),
}

/// Parse a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_env_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

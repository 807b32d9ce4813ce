use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_HOST: &str = "api.run.pivotal.io";
const DEFAULT_TOKEN_FILE: &str = ".cf_java_client.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_url: String,
    pub organization: String,
    pub space: String,
    pub username: String,
    pub password: Option<String>,
    pub skip_ssl_validation: bool,
    pub token_file: PathBuf,
    pub http_timeout_secs: u64,
    pub detail_concurrency: usize,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_host = get("CF_API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        let api_url = get("CF_API_URL")
            .unwrap_or_else(|| format!("https://{}", api_host))
            .trim_end_matches('/')
            .to_string();

        let config = Config {
            api_url,
            api_host,
            organization: require("CF_ORG")?,
            space: require("CF_SPACE")?,
            username: require("CF_USERNAME")?,
            password: get("CF_PASSWORD"),
            skip_ssl_validation: get("CF_SKIP_SSL_VALIDATION")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
            token_file: get("CF_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
            http_timeout_secs: parse_or("CF_HTTP_TIMEOUT_SECS", get("CF_HTTP_TIMEOUT_SECS"), 60)?,
            detail_concurrency: parse_or("CF_DETAIL_CONCURRENCY", get("CF_DETAIL_CONCURRENCY"), 8)?
                .max(1),
            environment: match get("ENVIRONMENT").as_deref() {
                Some("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match get("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

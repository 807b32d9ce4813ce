use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cached credential persisted between runs. Never holds a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub refresh_token: String,
}

/// On-disk shape, compatible with the Java client's token file
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenCacheError {
    #[error("token file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token file serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("refusing to cache an empty refresh token")]
    EmptyToken,
}

pub struct TokenFileRepository {
    path: PathBuf,
}

impl TokenFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached credential.
    ///
    /// A missing, empty or malformed file and an empty token all read as
    /// `None`; the caller only cares whether a usable token exists.
    pub fn read(&self) -> Option<CredentialRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No token file present");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Token file unreadable, ignoring"
                );
                return None;
            }
        };

        if raw.trim().is_empty() {
            return None;
        }

        let file: TokenFile = match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Token file malformed, ignoring"
                );
                return None;
            }
        };

        file.refresh_token
            .filter(|token| !token.is_empty())
            .map(|refresh_token| CredentialRecord { refresh_token })
    }

    /// Overwrite the token file with `record`.
    ///
    /// Writes a sibling temp file and renames it over the target so readers
    /// never observe a half-written document.
    pub fn write(&self, record: &CredentialRecord) -> Result<(), TokenCacheError> {
        if record.refresh_token.is_empty() {
            return Err(TokenCacheError::EmptyToken);
        }

        let body = serde_json::to_vec_pretty(&TokenFile {
            refresh_token: Some(record.refresh_token.clone()),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let tmp_path = self.temp_path();
        let result = write_private(&tmp_path, &body)
            .and_then(|_| fs::rename(&tmp_path, &self.path));

        if let Err(source) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.io_error(source));
        }

        tracing::debug!(path = %self.path.display(), "Refresh token cached");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> TokenCacheError {
        TokenCacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()
}

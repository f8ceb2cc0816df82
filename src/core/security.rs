use std::env;
use std::fs;
use std::path::PathBuf;
#[cfg(windows)]
use std::{path::Path, process::Command};

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone)]
pub struct SessionToken {
    value: String,
}

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Resolve the token callers must present.
///
/// `PENMARK_SESSION_TOKEN` wins; otherwise a fresh token is generated and
/// written owner-readable to the data directory.
pub fn init_session_token(paths: &AppPaths) -> SessionToken {
    if let Ok(token) = env::var("PENMARK_SESSION_TOKEN") {
        if !token.trim().is_empty() {
            return SessionToken::new(token.trim());
        }
    }

    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let token_path = session_token_path(paths);
    if let Some(parent) = token_path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("Failed to create {}: {}", parent.display(), err);
        }
    }
    if let Err(err) = fs::write(&token_path, &token) {
        tracing::warn!("Failed to write session token: {}", err);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let restricted = fs::metadata(&token_path).and_then(|metadata| {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&token_path, perms)
        });
        if let Err(err) = restricted {
            tracing::warn!(
                "Failed to restrict permissions on {}: {}",
                token_path.display(),
                err
            );
        }
    }
    #[cfg(windows)]
    {
        apply_windows_token_acl(&token_path);
    }

    SessionToken::new(token)
}

pub fn session_token_path(paths: &AppPaths) -> PathBuf {
    paths.user_data_dir.join(".session_token")
}

#[cfg(windows)]
fn apply_windows_token_acl(path: &Path) {
    let Some(path_str) = path.to_str() else {
        return;
    };

    let username = match env::var("USERNAME") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return,
    };
    let grant = format!("{}:(F)", username);

    let status = Command::new("icacls")
        .arg(path_str)
        .arg("/inheritance:r")
        .arg("/grant:r")
        .arg(&grant)
        .status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!(
            "Failed to apply Windows ACL to session token (status: {})",
            status
        ),
        Err(err) => tracing::warn!("Failed to run icacls for session token ACL: {}", err),
    }
}

/// Check the caller's credentials and return the key identifying them.
///
/// Accepts either `x-api-key: <token>` or `Authorization: Bearer <token>`.
/// The returned key is derived from the verified token, so rate limits are
/// bucketed by credential and cannot be steered by other request headers.
pub fn require_api_key(headers: &HeaderMap, expected: &SessionToken) -> Result<String, ApiError> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix(BEARER_PREFIX))
                .map(|token| token.trim().to_string())
        })
        .unwrap_or_default();

    if presented.is_empty() || presented != expected.value() {
        return Err(ApiError::Unauthorized);
    }

    Ok(caller_key(&presented))
}

/// Short, stable fingerprint of a token, safe to log.
pub fn caller_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

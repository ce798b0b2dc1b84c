//! Bearer token storage.
//!
//! The login token survives restarts in a single file, read once at startup and attached to every
//! backend request as `Authorization: Bearer <token>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::errors::AppError;

/// Authorization scheme prefix for the token header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Shared handle to the current authentication token.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the token file at `path`. A missing or blank file means no token.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let token = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), present = token.is_some(), "Opened token store");

        Ok(Self {
            path: Some(path),
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current token, if any.
    pub fn get(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Full `Authorization` header value for the current token.
    pub fn bearer(&self) -> Option<String> {
        self.get().map(|t| format!("{}{}", BEARER_PREFIX, t))
    }

    /// Replace the token and persist it.
    pub async fn set(&self, token: &str) -> Result<(), AppError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            tokio::fs::write(path, token).await?;
        }
        self.replace(Some(token.to_string()));
        Ok(())
    }

    /// Forget the token and delete the file.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.replace(None);
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn replace(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

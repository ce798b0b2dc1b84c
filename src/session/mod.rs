//! Process-wide session cache.
//!
//! The first view that asks for the session probes `GET /api/users/profile`; later views read the
//! cached answer. Login, logout, and probe failures invalidate it explicitly.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::errors::AppError;
use crate::models::{LoginRequest, Session};

/// What the cache currently knows about the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not probed yet, or invalidated
    Unknown,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Shared, lazily-probed session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    state: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SessionState::Unknown)),
        }
    }

    /// The current session, probing the backend if the cache is cold.
    ///
    /// The lock is held across the probe so concurrent callers share one request.
    pub async fn current(&self) -> Option<Session> {
        let mut state = self.state.lock().await;
        if *state == SessionState::Unknown {
            *state = self.probe().await;
        }
        state.session().cloned()
    }

    /// Cached state without probing.
    pub async fn peek(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Drop the cached answer; the next reader probes again.
    pub async fn invalidate(&self) {
        *self.state.lock().await = SessionState::Unknown;
    }

    /// Invalidate and probe again.
    pub async fn refresh(&self) -> Option<Session> {
        self.invalidate().await;
        self.current().await
    }

    async fn probe(&self) -> SessionState {
        match self.api.profile().await {
            Ok(session) => {
                tracing::debug!(user = %session.name, "Session probe succeeded");
                SessionState::Authenticated(session)
            }
            Err(err) => {
                tracing::debug!("Session probe failed, treating as anonymous: {}", err);
                if matches!(err, AppError::Unauthorized(_)) && self.api.tokens().get().is_some() {
                    if let Err(e) = self.api.tokens().clear().await {
                        tracing::warn!("Failed to clear rejected token: {}", e);
                    }
                }
                SessionState::Anonymous
            }
        }
    }

    /// Authenticate, keep the returned token, and re-probe.
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<Session>, AppError> {
        let response = self.api.login(request).await?;
        match response.token.as_deref() {
            Some(token) => self.api.tokens().set(token).await?,
            None => tracing::debug!("Login response carried no token, relying on cookies"),
        }
        Ok(self.refresh().await)
    }

    /// End the backend session. On failure the local state is left as it was.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.api.logout().await?;
        if let Err(e) = self.api.tokens().clear().await {
            tracing::warn!("Failed to clear token on logout: {}", e);
        }
        *self.state.lock().await = SessionState::Anonymous;
        Ok(())
    }
}

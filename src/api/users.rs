//! Account endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Session};

impl ApiClient {
    /// POST /api/users/register - Create an account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AppError> {
        let req = self
            .request(Method::POST, &["api", "users", "register"])?
            .json(request);
        self.send_empty(req).await
    }

    /// POST /api/users/login - Authenticate; the response carries the token.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let req = self
            .request(Method::POST, &["api", "users", "login"])?
            .json(request);
        self.send(req).await
    }

    /// POST /api/users/logout - End the backend session.
    pub async fn logout(&self) -> Result<(), AppError> {
        let req = self.request(Method::POST, &["api", "users", "logout"])?;
        self.send_empty(req).await
    }

    /// GET /api/users/profile - Current identity; fails when anonymous.
    pub async fn profile(&self) -> Result<Session, AppError> {
        let req = self.request(Method::GET, &["api", "users", "profile"])?;
        self.send(req).await
    }
}

//! Login page.

use super::{Navigation, FIELDS_REQUIRED};
use crate::models::LoginRequest;
use crate::routes::Route;
use crate::AppState;

pub const REGISTER_PROMPT: &str = "Don't have an account?";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn set(&mut self, field: &str, value: &str) -> bool {
        match field {
            "email" => self.email = value.to_string(),
            "password" => self.password = value.to_string(),
            _ => return false,
        }
        true
    }

    pub async fn submit(&self, state: &AppState) -> Navigation {
        if self.email.trim().is_empty() || self.password.is_empty() {
            state.notifier.error(FIELDS_REQUIRED);
            return None;
        }

        let request = LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match state.session.login(&request).await {
            Ok(session) => {
                if session.is_none() {
                    tracing::warn!("Login accepted but the profile probe failed");
                }
                state.notifier.success("Logged in successfully!");
                Some(Route::Home)
            }
            Err(e) => {
                state.notifier.error(e.user_message("Login failed"));
                None
            }
        }
    }
}

//! Registration page.

use super::{Navigation, FIELDS_REQUIRED};
use crate::models::{RegisterRequest, Role};
use crate::routes::Route;
use crate::AppState;

pub const HEADING: &str = "Get started with Bloggit!";
pub const LOGIN_PROMPT: &str = "Already have an account?";

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterForm {
    pub fn set(&mut self, field: &str, value: &str) -> bool {
        match field {
            "name" => self.name = value.to_string(),
            "username" => self.username = value.to_string(),
            "email" => self.email = value.to_string(),
            "password" => self.password = value.to_string(),
            "role" => {
                self.role = match value {
                    "reader" => Role::Reader,
                    "admin" => Role::Admin,
                    _ => Role::Author,
                }
            }
            _ => return false,
        }
        true
    }

    fn is_complete(&self) -> bool {
        [&self.name, &self.username, &self.email]
            .iter()
            .all(|v| !v.trim().is_empty())
            && !self.password.is_empty()
    }

    pub async fn submit(&self, state: &AppState) -> Navigation {
        if !self.is_complete() {
            state.notifier.error(FIELDS_REQUIRED);
            return None;
        }

        let request = RegisterRequest {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role,
        };
        match state.api.register(&request).await {
            Ok(()) => {
                state
                    .notifier
                    .success("Registration successful! Please log in.");
                Some(Route::Login)
            }
            Err(e) => {
                state.notifier.error(e.user_message("Registration failed"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_and_role_default() {
        let mut form = RegisterForm::default();
        assert_eq!(form.role, Role::Author);
        assert!(!form.is_complete());

        for (field, value) in [
            ("name", "Ada"),
            ("username", "ada"),
            ("email", "ada@example.com"),
            ("password", "secret"),
        ] {
            assert!(form.set(field, value));
        }
        assert!(form.is_complete());
        assert!(form.set("role", "reader"));
        assert_eq!(form.role, Role::Reader);
        assert!(!form.set("age", "36"));
    }
}

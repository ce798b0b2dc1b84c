//! Account and session models.

use serde::{Deserialize, Serialize};

/// Role a Bloggit account registers with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Author,
    Reader,
    Admin,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Reader => "reader",
            Role::Admin => "admin",
            Role::Other => "other",
        }
    }
}

/// The authenticated identity returned by `GET /api/users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// Request body for `POST /api/users/register`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Request body for `POST /api/users/login`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

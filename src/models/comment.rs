//! Comment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

/// A comment on a single post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Anonymous")
    }

    /// Avatar letter.
    pub fn initial(&self) -> char {
        self.author
            .as_ref()
            .and_then(|a| a.name.chars().next())
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

/// Request body for `POST /api/blogs/{id}/comments`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentInput {
    pub text: String,
}

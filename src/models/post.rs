//! Blog post model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::editor::strip_tags;

/// Characters of plain text shown in a listing snippet.
pub const SNIPPET_LENGTH: usize = 150;

/// Name-only author reference embedded in posts and comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    #[serde(default)]
    pub name: String,
}

/// A blog post as stored by the backend. `content` is editor markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown Author")
    }

    /// Plain-text preview for the listing.
    pub fn snippet(&self) -> String {
        let text: String = strip_tags(&self.content)
            .chars()
            .take(SNIPPET_LENGTH)
            .collect();
        format!("{}...", text)
    }

    pub fn published_on(&self) -> Option<String> {
        self.created_at.map(format_date)
    }
}

/// Request body for creating or updating a post.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

/// Date format used wherever a post or comment shows when it was written.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

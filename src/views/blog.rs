//! Post detail page with comments.

use uuid::Uuid;

use super::Navigation;
use crate::errors::AppError;
use crate::models::{Author, Comment, CommentInput, Post, Session};
use crate::routes::Route;
use crate::AppState;

pub const NOT_FOUND: &str = "Blog not found.";
pub const NO_RESPONSES: &str = "No responses yet.";
pub const COMMENT_PLACEHOLDER: &str = "Write a response...";
pub const COMMENT_PROMPT: &str = "Log in or sign up to leave a comment.";

/// A comment as shown in the list.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentEntry {
    /// From the backend's list
    Confirmed(Comment),
    /// Posted from here and not yet seen in a fetched list
    Provisional { client_id: Uuid, comment: Comment },
}

impl CommentEntry {
    pub fn comment(&self) -> &Comment {
        match self {
            CommentEntry::Confirmed(comment) => comment,
            CommentEntry::Provisional { comment, .. } => comment,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, CommentEntry::Provisional { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BlogView {
    pub id: String,
    pub post: Option<Post>,
    pub comments: Vec<CommentEntry>,
    pub session: Option<Session>,
    pub draft: String,
}

impl BlogView {
    /// Resolve the session, then the post, then its comments. A missing post is a state, not an
    /// error.
    pub async fn load(state: &AppState, id: &str) -> Self {
        let session = state.session.current().await;
        let mut view = Self {
            id: id.to_string(),
            post: None,
            comments: Vec::new(),
            session,
            draft: String::new(),
        };

        match state.api.get_post(id).await {
            Ok(post) => view.post = Some(post),
            Err(e) => {
                if !e.is_expected_absence() {
                    tracing::warn!(id, "Failed to fetch blog: {}", e);
                }
                return view;
            }
        }

        view.refresh_comments(state).await;
        view
    }

    /// Anonymous readers get a login prompt instead of the comment form.
    pub fn can_comment(&self) -> bool {
        self.session.is_some()
    }

    pub fn responses_heading(&self) -> String {
        format!("Responses ({})", self.comments.len())
    }

    /// Post the draft. On success the new comment goes to the head of the list as a provisional
    /// entry and the list is not refetched.
    pub async fn submit_comment(&mut self, state: &AppState) -> Result<(), AppError> {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            state.notifier.error("Comment cannot be empty.");
            return Err(AppError::Validation("Comment cannot be empty.".to_string()));
        }
        let Some(session) = self.session.clone() else {
            state.notifier.error(COMMENT_PROMPT);
            return Err(AppError::Unauthorized(None));
        };

        let input = CommentInput { text };
        match state.api.create_comment(&self.id, &input).await {
            Ok(mut comment) => {
                comment.author = Some(Author { name: session.name });
                self.comments.insert(
                    0,
                    CommentEntry::Provisional {
                        client_id: Uuid::new_v4(),
                        comment,
                    },
                );
                self.draft.clear();
                state.notifier.success("Comment posted!");
                Ok(())
            }
            Err(e) => {
                state
                    .notifier
                    .error("Failed to post comment. Please try again.");
                Err(e)
            }
        }
    }

    /// Replace the list with the backend's. Provisional entries either reappear as confirmed or
    /// are gone. Failures keep the current list.
    pub async fn refresh_comments(&mut self, state: &AppState) {
        match state.api.list_comments(&self.id).await {
            Ok(comments) => {
                self.comments = comments.into_iter().map(CommentEntry::Confirmed).collect();
            }
            Err(e) => tracing::warn!(id = %self.id, "Failed to fetch comments: {}", e),
        }
    }

    pub async fn delete_post(&mut self, state: &AppState) -> Navigation {
        match state.api.delete_post(&self.id).await {
            Ok(()) => {
                state.notifier.success("Blog deleted.");
                Some(Route::Home)
            }
            Err(e) => {
                state
                    .notifier
                    .error(e.user_message("Failed to delete blog post"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            text: "Nice".to_string(),
            author: None,
            created_at: None,
        }
    }

    #[test]
    fn test_entry_accessors() {
        let confirmed = CommentEntry::Confirmed(comment("c1"));
        let provisional = CommentEntry::Provisional {
            client_id: Uuid::new_v4(),
            comment: comment("c2"),
        };
        assert!(!confirmed.is_provisional());
        assert!(provisional.is_provisional());
        assert_eq!(provisional.comment().id, "c2");
    }

    #[test]
    fn test_heading_counts_entries() {
        let view = BlogView {
            id: "p1".into(),
            post: None,
            comments: vec![CommentEntry::Confirmed(comment("c1"))],
            session: None,
            draft: String::new(),
        };
        assert_eq!(view.responses_heading(), "Responses (1)");
        assert!(!view.can_comment());
    }
}

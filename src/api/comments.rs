//! Comment endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::errors::AppError;
use crate::models::{Comment, CommentInput};

impl ApiClient {
    /// GET /api/blogs/:id/comments - List comments on a post.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let req = self.request(Method::GET, &["api", "blogs", post_id, "comments"])?;
        self.send(req).await
    }

    /// POST /api/blogs/:id/comments - Comment on a post.
    pub async fn create_comment(
        &self,
        post_id: &str,
        input: &CommentInput,
    ) -> Result<Comment, AppError> {
        let req = self
            .request(Method::POST, &["api", "blogs", post_id, "comments"])?
            .json(input);
        self.send(req).await
    }
}

//! Blog post endpoints.

use reqwest::Method;

use super::ApiClient;
use crate::errors::AppError;
use crate::models::{Post, PostInput};

impl ApiClient {
    /// GET /api/blogs - List all posts.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let req = self.request(Method::GET, &["api", "blogs"])?;
        self.send(req).await
    }

    /// GET /api/blogs/:id - Fetch a single post.
    pub async fn get_post(&self, id: &str) -> Result<Post, AppError> {
        let req = self.request(Method::GET, &["api", "blogs", id])?;
        self.send(req).await
    }

    /// POST /api/blogs - Create a post.
    pub async fn create_post(&self, input: &PostInput) -> Result<Post, AppError> {
        let req = self.request(Method::POST, &["api", "blogs"])?.json(input);
        self.send(req).await
    }

    /// PUT /api/blogs/:id - Update a post.
    pub async fn update_post(&self, id: &str, input: &PostInput) -> Result<Post, AppError> {
        let req = self
            .request(Method::PUT, &["api", "blogs", id])?
            .json(input);
        self.send(req).await
    }

    /// DELETE /api/blogs/:id - Delete a post.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let req = self.request(Method::DELETE, &["api", "blogs", id])?;
        self.send_empty(req).await
    }
}

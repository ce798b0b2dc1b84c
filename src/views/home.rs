//! Home page: the feed for members, the landing page for everyone else.

use crate::models::Post;
use crate::AppState;

pub const FEED_HEADING: &str = "For You";
pub const EMPTY_FEED: &str = "No blog posts found.";
pub const LANDING_HEADLINE: &str = "Your Voice, Your Story.";
pub const LANDING_TAGLINE: &str = "A platform to share, discover, and connect with a world of ideas.";
pub const GET_STARTED: &str = "Get Started";

/// One row of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub snippet: String,
    pub published_on: Option<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author: post.author_name().to_string(),
            snippet: post.snippet(),
            published_on: post.published_on(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeView {
    Landing,
    Feed(Vec<PostSummary>),
}

impl HomeView {
    pub async fn load(state: &AppState) -> Self {
        if state.session.current().await.is_none() {
            return HomeView::Landing;
        }

        match state.api.list_posts().await {
            Ok(posts) => HomeView::Feed(posts.iter().map(PostSummary::from).collect()),
            Err(e) => {
                tracing::warn!("Failed to fetch blogs: {}", e);
                HomeView::Feed(Vec::new())
            }
        }
    }

    #[cfg(test)]
    pub fn posts(&self) -> &[PostSummary] {
        match self {
            HomeView::Feed(posts) => posts,
            HomeView::Landing => &[],
        }
    }
}

//! REST API client.
//!
//! One method per backend capability. No retries, caching, or batching: every call is a single
//! request whose failure is returned to the caller as an [`AppError`].

mod blogs;
mod comments;
mod grammar;
mod upload;
mod users;

use reqwest::{header, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::auth::TokenStore;
use crate::config::Config;
use crate::errors::AppError;

/// Thin client over the Bloggit backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    /// Build a client for the backend named in `config`.
    pub fn new(config: &Config, tokens: TokenStore) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid BLOGGIT_API_BASE_URL {:?}: {}",
                config.api_base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "BLOGGIT_API_BASE_URL {:?} cannot be used as a base URL",
                config.api_base_url
            )));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with the stored token attached.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, AppError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "Backend request");

        let builder = self.http.request(method, url);
        Ok(match self.tokens.bearer() {
            Some(bearer) => builder.header(header::AUTHORIZATION, bearer),
            None => builder,
        })
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = checked(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose body, if any, is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), AppError> {
        checked(request.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success status into an error carrying the backend's message.
async fn checked(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.bytes().await.unwrap_or_default();
    let err = AppError::from_status(status, &body);
    if err.is_expected_absence() {
        tracing::debug!(%url, %status, "Backend reported absence");
    } else {
        tracing::warn!(%url, %status, "Backend request failed: {}", err);
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = Config::for_backend(base, "./unused-token");
        ApiClient::new(&config, TokenStore::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn test_requests_carry_the_stored_token() {
        let config = Config::for_backend("http://localhost:5001", "./unused-token");
        let tokens = TokenStore::in_memory();
        let api = ApiClient::new(&config, tokens.clone()).unwrap();

        let req = api
            .request(Method::GET, &["api", "users", "profile"])
            .unwrap()
            .build()
            .unwrap();
        assert!(req.headers().get(header::AUTHORIZATION).is_none());

        tokens.set("abc123").await.unwrap();
        let req = api
            .request(Method::GET, &["api", "users", "profile"])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.headers()[header::AUTHORIZATION], "Bearer abc123");
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:5001");
        let url = api.endpoint(&["api", "blogs", "42", "comments"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/blogs/42/comments");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("http://example.com/bloggit/");
        let url = api.endpoint(&["api", "blogs"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/bloggit/api/blogs");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let api = client("http://localhost:5001");
        let url = api.endpoint(&["api", "blogs", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/blogs/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = Config::for_backend("not a url", "./unused-token");
        let err = ApiClient::new(&config, TokenStore::in_memory()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}

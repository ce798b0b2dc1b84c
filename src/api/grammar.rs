//! Grammar check endpoint.

use reqwest::Method;

use super::ApiClient;
use crate::errors::AppError;
use crate::grammar::GrammarChecker;
use crate::models::{GrammarCheckRequest, GrammarCheckResponse, GrammarMatch};

impl ApiClient {
    /// POST /api/grammar-check - Analyse plain text.
    pub async fn grammar_check(&self, text: &str) -> Result<GrammarCheckResponse, AppError> {
        let req = self
            .request(Method::POST, &["api", "grammar-check"])?
            .json(&GrammarCheckRequest { text });
        self.send(req).await
    }
}

impl GrammarChecker for ApiClient {
    async fn check(&self, text: String) -> Result<Vec<GrammarMatch>, AppError> {
        Ok(self.grammar_check(&text).await?.into_matches())
    }
}

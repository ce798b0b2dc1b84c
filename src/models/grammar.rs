//! Grammar check request and response models.

use serde::{Deserialize, Serialize};

/// One suggested replacement for a flagged span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Replacement {
    pub value: String,
}

/// A span of the document's plain text that the grammar service flagged.
///
/// `offset` and `length` count characters of the text that was submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrammarMatch {
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

impl GrammarMatch {
    /// The first suggested replacement, which is what a one-click fix applies.
    pub fn suggestion(&self) -> Option<&str> {
        self.replacements.first().map(|r| r.value.as_str())
    }
}

/// Request body for `POST /api/grammar-check`.
#[derive(Debug, Clone, Serialize)]
pub struct GrammarCheckRequest<'a> {
    pub text: &'a str,
}

/// Response body of `POST /api/grammar-check`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarCheckResponse {
    #[serde(default)]
    pub matches: Option<Vec<GrammarMatch>>,
}

impl GrammarCheckResponse {
    pub fn into_matches(self) -> Vec<GrammarMatch> {
        self.matches.unwrap_or_default()
    }
}

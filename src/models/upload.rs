//! Image upload models.

use std::path::Path;

use serde::Deserialize;

use crate::errors::AppError;

/// An image picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_for(path).to_string();
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Matches the picker filter `image/*`.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Response body of `POST /api/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

//! Image upload endpoint.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::ApiClient;
use crate::editor::ImageUploader;
use crate::errors::AppError;
use crate::models::{ImageFile, UploadResponse};

/// Multipart field the backend reads the image from.
const IMAGE_FIELD: &str = "image";

impl ApiClient {
    /// POST /api/upload - Store an image; the response carries its public URL.
    pub async fn upload_image(&self, image: ImageFile) -> Result<UploadResponse, AppError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let req = self.request(Method::POST, &["api", "upload"])?.multipart(form);
        self.send(req).await
    }
}

impl ImageUploader for ApiClient {
    async fn upload(&self, image: ImageFile) -> Result<String, AppError> {
        Ok(self.upload_image(image).await?.url)
    }
}

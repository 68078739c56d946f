use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::contract::model::ImageUpload;
use crate::domain::error::DomainError;
use crate::domain::ports::ImageStore;

pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone)]
pub struct CloudinarySettings {
    pub api_base: Url,
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Unsigned uploads to a Cloudinary upload preset.
pub struct CloudinaryImageStore {
    http: reqwest::Client,
    settings: CloudinarySettings,
}

impl CloudinaryImageStore {
    pub fn new(http: reqwest::Client, settings: CloudinarySettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self) -> Result<(Url, &str), DomainError> {
        let (Some(cloud), Some(preset)) = (
            self.settings.cloud_name.as_deref(),
            self.settings.upload_preset.as_deref(),
        ) else {
            return Err(DomainError::upstream(
                "cloudinary",
                "image uploads are not configured",
            ));
        };
        let url = self
            .settings
            .api_base
            .join(&format!("v1_1/{cloud}/image/upload"))
            .map_err(|e| DomainError::internal(format!("bad cloudinary url: {e}")))?;
        Ok((url, preset))
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, DomainError> {
        let (url, preset) = self.endpoint()?;
        debug!(file = %image.file_name, size = image.bytes.len(), "Uploading image");

        let mut part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name);
        if let Some(ct) = image.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|e| DomainError::validation("images", format!("bad content type: {e}")))?;
        }
        let mut form = Form::new()
            .part("file", part)
            .text("upload_preset", preset.to_owned());
        if let Some(folder) = self.settings.folder.clone() {
            form = form.text("folder", folder);
        }

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::upstream("cloudinary", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Image upload rejected");
            return Err(DomainError::upstream(
                "cloudinary",
                format!("upload failed with status {status}"),
            ));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| DomainError::upstream("cloudinary", format!("bad response: {e}")))?;
        Ok(uploaded.secure_url)
    }
}

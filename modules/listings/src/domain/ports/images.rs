use async_trait::async_trait;

use crate::contract::model::ImageUpload;
use crate::domain::error::DomainError;

/// Hosts listing images and hands back their public URLs.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String, DomainError>;
}

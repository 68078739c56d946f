use api_ingress::AppError;
use axum::extract::{multipart::MultipartError, Multipart};
use tracing::debug;

use crate::api::rest::dto::{ListingDataReq, NumberOrString};
use crate::contract::model::ImageUpload;

/// A listing create/update form after all parts are read.
#[derive(Debug, Default)]
pub struct ListingForm {
    pub data: ListingDataReq,
    pub existing_images: Vec<String>,
    pub images: Vec<ImageUpload>,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Reads `listingData` (JSON) or the plain `title`/`description`/`price`/
/// `location`/`country` fields, repeated `existingImages` URLs and `images` files.
/// When `listingData` is present the plain fields are ignored.
pub async fn read_listing_form(mut multipart: Multipart) -> Result<ListingForm, AppError> {
    let mut form = ListingForm::default();
    let mut listing_data: Option<ListingDataReq> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "listingData" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let data = serde_json::from_str(&raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid listingData: {e}")))?;
                listing_data = Some(data);
            }
            "images" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if bytes.is_empty() {
                    continue;
                }
                form.images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "existingImages" | "existingImages[]" => {
                let url = field.text().await.map_err(bad_multipart)?;
                if !url.trim().is_empty() {
                    form.existing_images.push(url);
                }
            }
            "title" | "description" | "location" | "country" | "price" => {
                let value = field.text().await.map_err(bad_multipart)?;
                let d = &mut form.data;
                match name.as_str() {
                    "title" => d.title = Some(value),
                    "description" => d.description = Some(value),
                    "location" => d.location = Some(value),
                    "country" => d.country = Some(value),
                    _ => d.price = Some(NumberOrString::Text(value)),
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    if let Some(data) = listing_data {
        form.data = data;
    }
    Ok(form)
}

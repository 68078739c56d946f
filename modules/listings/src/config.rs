use serde::{Deserialize, Serialize};

use crate::contract::model::PLACEHOLDER_IMAGE_URL;
use crate::infra::auth::google::GOOGLE_JWKS_URL;
use crate::infra::images::cloudinary::CLOUDINARY_API_BASE;

/// Listings module configuration, read from `modules.listings`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ListingsConfig {
    /// HS256 signing secret for bearer tokens. Required.
    pub jwt_secret: String,
    pub token_ttl_days: i64,

    /// Expected audience of Google ID tokens. Google sign-in is refused when unset.
    pub google_client_id: Option<String>,
    pub google_jwks_url: String,

    pub cloudinary_api_base: String,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_upload_preset: Option<String>,
    pub cloudinary_folder: Option<String>,

    pub placeholder_image: String,
    pub max_images_per_listing: usize,
    /// Timeout for outgoing calls (image uploads, key fetches).
    pub http_timeout_secs: u64,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_days: 30,
            google_client_id: None,
            google_jwks_url: GOOGLE_JWKS_URL.to_string(),
            cloudinary_api_base: CLOUDINARY_API_BASE.to_string(),
            cloudinary_cloud_name: None,
            cloudinary_upload_preset: None,
            cloudinary_folder: Some("roost".to_string()),
            placeholder_image: PLACEHOLDER_IMAGE_URL.to_string(),
            max_images_per_listing: 10,
            http_timeout_secs: 10,
        }
    }
}

//! Transport-agnostic models shared by the service, the local client and the REST layer.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Image stored on a listing when none were uploaded.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1449844908441-8829872d2607?q=80&w=2070&auto=format&fit=crop&ixlib=rb-4.0.3&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D";

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// How a user proves who they are. A user has exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2 PHC string.
    Password { hash: String },
    /// Google account subject (`sub` claim).
    Google { subject: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub credential: Credential,
    pub email: Option<String>,
    pub gmail: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl User {
    pub fn password_hash(&self) -> Option<&str> {
        match &self.credential {
            Credential::Password { hash } => Some(hash),
            Credential::Google { .. } => None,
        }
    }

    pub fn google_id(&self) -> Option<&str> {
        match &self.credential {
            Credential::Google { subject } => Some(subject),
            Credential::Password { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: f64,
    pub location: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<GeoPoint>,
    pub owner: Uuid,
    /// Review ids in insertion order.
    pub reviews: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a listing. Images travel separately as uploads.
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

/// Partial update for a listing.
///
/// `title`, `location` and `country` are ignored when blank. Coordinates are
/// applied only when both `lat` and `lng` are present.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// One uploaded image file, as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub listing: Uuid,
    pub author: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub listing: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Public slice of a review author.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub gmail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewWithAuthor {
    pub review: Review,
    /// `None` when the author account no longer exists.
    pub author: Option<AuthorSummary>,
}

/// The caller's own account with its reference sets resolved.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub listings: Vec<Listing>,
    pub reviews: Vec<Uuid>,
    pub wishlist: Vec<Listing>,
}

/// Contact fields a user may change. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub gmail: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishlistToggle {
    pub change: WishlistChange,
    pub wishlist: Vec<Uuid>,
}

/// An authenticated user together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

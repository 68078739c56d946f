use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::ListingsError,
    model::{Listing, Review, ReviewWithAuthor, User, WishlistToggle},
};

/// In-process API of the listings module for other modules.
///
/// Read-mostly: mutations that need uploads or credentials stay behind the
/// REST surface.
#[async_trait]
pub trait ListingsApi: Send + Sync {
    /// Resolve a bearer token to its user.
    async fn authenticate(&self, token: &str) -> Result<User, ListingsError>;

    async fn get_listing(&self, id: Uuid) -> Result<Listing, ListingsError>;

    /// Case-insensitive substring search; `None` or blank returns everything.
    async fn search_listings(&self, query: Option<String>) -> Result<Vec<Listing>, ListingsError>;

    async fn list_reviews(&self, listing_id: Uuid)
        -> Result<Vec<ReviewWithAuthor>, ListingsError>;

    async fn get_review(&self, id: Uuid) -> Result<Review, ListingsError>;

    async fn toggle_wishlist(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<WishlistToggle, ListingsError>;
}

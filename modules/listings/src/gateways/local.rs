use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::ListingsApi,
    error::ListingsError,
    model::{Listing, Review, ReviewWithAuthor, User, WishlistToggle},
};
use crate::domain::service::Service;

/// Local implementation of the ListingsApi trait that delegates to the domain service
pub struct ListingsLocalClient {
    service: Arc<Service>,
}

impl ListingsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ListingsApi for ListingsLocalClient {
    async fn authenticate(&self, token: &str) -> Result<User, ListingsError> {
        Ok(self.service.authenticate(token).await?)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Listing, ListingsError> {
        Ok(self.service.get_listing(id).await?)
    }

    async fn search_listings(&self, query: Option<String>) -> Result<Vec<Listing>, ListingsError> {
        Ok(self.service.search_listings(query.as_deref()).await?)
    }

    async fn list_reviews(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, ListingsError> {
        Ok(self.service.list_reviews(listing_id).await?)
    }

    async fn get_review(&self, id: Uuid) -> Result<Review, ListingsError> {
        Ok(self.service.get_review(id).await?)
    }

    async fn toggle_wishlist(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<WishlistToggle, ListingsError> {
        Ok(self.service.toggle_wishlist(user_id, listing_id).await?)
    }
}

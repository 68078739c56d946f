//! Persistence ports. The service opens one [`MarketTx`] per operation and
//! touches every store through it, so multi-record mutations commit or roll
//! back together.

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Listing, Review, User};

/// Carried inside the `anyhow::Error` of an insert that hit a unique index,
/// so callers can tell a lost race from a broken store.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key in {table}")]
pub struct DuplicateKey {
    pub table: &'static str,
}

/// The embedded id arrays of the document model, one kind per relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefSet {
    /// user -> listings they own
    UserListings,
    /// user -> reviews they wrote
    UserReviews,
    /// user -> listings they saved
    UserWishlist,
    /// listing -> reviews written about it
    ListingReviews,
}

impl RefSet {
    pub fn as_str(self) -> &'static str {
        match self {
            RefSet::UserListings => "user_listings",
            RefSet::UserReviews => "user_reviews",
            RefSet::UserWishlist => "user_wishlist",
            RefSet::ListingReviews => "listing_reviews",
        }
    }
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_google_id(&self, subject: &str) -> anyhow::Result<Option<User>>;
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    /// Load several users; missing ids are skipped, order is unspecified.
    async fn find_users(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>>;
    async fn insert_user(&self, u: &User) -> anyhow::Result<()>;
    /// Update an existing user (by primary key in `u.id`).
    async fn update_user(&self, u: &User) -> anyhow::Result<()>;
}

/// Listings come back with `reviews` filled from [`RefSet::ListingReviews`].
#[async_trait]
pub trait ListingsRepository: Send + Sync {
    async fn find_listing(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;
    /// Load several listings in the order of `ids`; missing ids are skipped.
    async fn find_listings(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Listing>>;
    /// Every listing in insertion order.
    async fn all_listings(&self) -> anyhow::Result<Vec<Listing>>;
    /// Listings whose title, location, country or description contains `needle`
    /// (case-insensitive, literal), in insertion order.
    async fn search_listings(&self, needle: &str) -> anyhow::Result<Vec<Listing>>;
    /// Like [`Self::search_listings`] but matching title, location and country only.
    async fn match_listing_labels(&self, needle: &str) -> anyhow::Result<Vec<Listing>>;
    async fn listings_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Listing>>;
    async fn insert_listing(&self, l: &Listing) -> anyhow::Result<()>;
    async fn update_listing(&self, l: &Listing) -> anyhow::Result<()>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete_listing(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    async fn find_review(&self, id: Uuid) -> anyhow::Result<Option<Review>>;
    /// Reviews of one listing, oldest first.
    async fn reviews_for_listing(&self, listing: Uuid) -> anyhow::Result<Vec<Review>>;
    async fn insert_review(&self, r: &Review) -> anyhow::Result<()>;
    async fn update_review(&self, r: &Review) -> anyhow::Result<()>;
    async fn delete_review(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Ordered, duplicate-free id sets owned by a user or a listing.
#[async_trait]
pub trait ReferenceSets: Send + Sync {
    /// Append `target` unless already present.
    async fn push_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<()>;
    /// Remove `target`; true if it was present.
    async fn pull_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<bool>;
    async fn contains_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<bool>;
    /// Members in insertion order.
    async fn list_refs(&self, set: RefSet, owner: Uuid) -> anyhow::Result<Vec<Uuid>>;
    /// Remove `target` from every set of this kind; returns how many were removed.
    async fn pull_target(&self, set: RefSet, target: Uuid) -> anyhow::Result<u64>;
}

/// One unit of work across all stores. Dropping it without [`MarketTx::commit`]
/// rolls everything back.
#[async_trait]
pub trait MarketTx: UsersRepository + ListingsRepository + ReviewsRepository + ReferenceSets {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn MarketTx>>;
}

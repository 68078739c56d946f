use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    AuthorSummary, Credential, GeoPoint, ImageUpload, Listing, ListingPatch, NewListing,
    NewReview, Profile, ProfilePatch, Review, ReviewPatch, ReviewWithAuthor, Session, User,
    WishlistChange, WishlistToggle, MAX_RATING, MIN_RATING, PLACEHOLDER_IMAGE_URL,
};
use crate::domain::error::DomainError;
use crate::domain::ports::{
    ExternalIdentity, IdentityVerifier, ImageStore, PasswordHasher, TokenIssuer,
};
use crate::domain::repo::{
    DuplicateKey, ListingsRepository, MarketStore, MarketTx, RefSet, ReferenceSets, ReviewsRepository,
    UsersRepository,
};

/// Domain service: the consistency layer over users, listings, reviews and
/// the reference sets between them. Every operation runs in one store
/// transaction; reads use one too so they see a consistent snapshot.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn MarketStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    images: Arc<dyn ImageStore>,
    identity: Arc<dyn IdentityVerifier>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub placeholder_image: String,
    pub max_images_per_listing: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            placeholder_image: PLACEHOLDER_IMAGE_URL.to_string(),
            max_images_per_listing: 10,
        }
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_blank(v))
}

fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(DomainError::rating_out_of_range(rating))
    }
}

fn validate_price(price: f64) -> Result<(), DomainError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(DomainError::validation(
            "price",
            "Price must be a non-negative number",
        ))
    }
}

fn ensure_owner(listing: &Listing, actor: Uuid, message: &str) -> Result<(), DomainError> {
    if listing.owner == actor {
        Ok(())
    } else {
        Err(DomainError::forbidden(message))
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        store: Arc<dyn MarketStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        images: Arc<dyn ImageStore>,
        identity: Arc<dyn IdentityVerifier>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            images,
            identity,
            config,
        }
    }

    async fn begin(&self) -> Result<Box<dyn MarketTx>, DomainError> {
        self.store.begin().await.map_err(db_err)
    }

    // ---------------------------------------------------------------------
    // Credentials
    // ---------------------------------------------------------------------

    #[instrument(name = "listings.service.register", skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        info!("Registering user");

        let username = username.trim();
        if username.is_empty() || is_blank(password) {
            return Err(DomainError::validation("username", "All fields are required"));
        }

        let hash = self.hash_password(password).await?;

        let user = User {
            id: Uuid::new_v4(),
            username: Some(username.to_string()),
            credential: Credential::Password { hash },
            email: None,
            gmail: None,
            phone_no: None,
            address: None,
            profile_picture: None,
            name: None,
            joined_at: Utc::now(),
        };
        // The unique index on username decides, so concurrent registrations
        // of one name yield exactly one account.
        let tx = self.begin().await?;
        tx.insert_user(&user).await.map_err(|e| {
            if e.is::<DuplicateKey>() {
                DomainError::username_taken(username)
            } else {
                db_err(e)
            }
        })?;
        tx.commit().await.map_err(db_err)?;

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "Successfully registered user");
        Ok(Session { user, token })
    }

    #[instrument(name = "listings.service.login", skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        debug!("Logging in");

        let user = {
            let tx = self.begin().await?;
            tx.find_user_by_username(username.trim())
                .await
                .map_err(db_err)?
        };

        let Some(user) = user else {
            debug!("Unknown username");
            return Err(DomainError::InvalidCredentials);
        };
        let Some(hash) = user.password_hash() else {
            debug!("Account has no password credential");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.verify_password(password, hash).await? {
            debug!("Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok(Session { user, token })
    }

    /// Resolve a bearer token to the user it was issued for.
    #[instrument(name = "listings.service.authenticate", skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let user_id = self.tokens.verify(token)?;

        let tx = self.begin().await?;
        tx.find_user(user_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::unauthenticated(format!("user {user_id} no longer exists")))
    }

    /// Sign in with an external ID token, provisioning the account on first sight.
    #[instrument(name = "listings.service.authenticate_external", skip_all)]
    pub async fn authenticate_external(&self, id_token: &str) -> Result<Session, DomainError> {
        if is_blank(id_token) {
            return Err(DomainError::validation("token", "Token is required"));
        }

        let identity = self.identity.verify(id_token).await?;
        debug!(subject = %identity.subject, "External identity verified");

        let tx = self.begin().await?;
        let user = match tx
            .find_user_by_google_id(&identity.subject)
            .await
            .map_err(db_err)?
        {
            Some(mut user) => {
                if identity.name.is_some() {
                    user.name = identity.name;
                }
                if identity.picture.is_some() {
                    user.profile_picture = identity.picture;
                }
                tx.update_user(&user).await.map_err(db_err)?;
                debug!(user_id = %user.id, "Refreshed external user profile");
                user
            }
            None => {
                let user = self.provision_external_user(tx.as_ref(), identity).await?;
                info!(user_id = %user.id, username = ?user.username, "Provisioned external user");
                user
            }
        };
        tx.commit().await.map_err(db_err)?;

        let token = self.tokens.issue(user.id)?;
        Ok(Session { user, token })
    }

    async fn provision_external_user(
        &self,
        tx: &dyn MarketTx,
        identity: ExternalIdentity,
    ) -> Result<User, DomainError> {
        let base = identity
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
            .unwrap_or("user")
            .to_string();
        let username = unique_username(tx, &base).await?;

        let user = User {
            id: Uuid::new_v4(),
            username: Some(username),
            credential: Credential::Google {
                subject: identity.subject,
            },
            gmail: identity.email.clone(),
            email: identity.email,
            phone_no: None,
            address: None,
            profile_picture: identity.picture,
            name: identity.name,
            joined_at: Utc::now(),
        };
        tx.insert_user(&user).await.map_err(db_err)?;
        Ok(user)
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("password hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("password check task failed: {e}")))?
    }

    // ---------------------------------------------------------------------
    // Profile & wishlist
    // ---------------------------------------------------------------------

    #[instrument(name = "listings.service.get_profile", skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, DomainError> {
        debug!("Getting profile");
        let tx = self.begin().await?;
        let user = tx
            .find_user(user_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        load_profile(tx.as_ref(), user).await
    }

    #[instrument(name = "listings.service.update_profile", skip(self, patch), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DomainError> {
        info!("Updating profile");
        let tx = self.begin().await?;
        let mut user = tx
            .find_user(user_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;

        if let Some(gmail) = non_blank(patch.gmail) {
            user.gmail = Some(gmail);
        }
        if let Some(phone_no) = non_blank(patch.phone_no) {
            user.phone_no = Some(phone_no);
        }
        if let Some(address) = non_blank(patch.address) {
            user.address = Some(address);
        }

        tx.update_user(&user).await.map_err(db_err)?;
        let profile = load_profile(tx.as_ref(), user).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(profile)
    }

    #[instrument(name = "listings.service.list_owned_listings", skip(self), fields(user_id = %user_id))]
    pub async fn list_owned_listings(&self, user_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        let tx = self.begin().await?;
        tx.listings_by_owner(user_id).await.map_err(db_err)
    }

    #[instrument(name = "listings.service.get_wishlist", skip(self), fields(user_id = %user_id))]
    pub async fn get_wishlist(&self, user_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        let tx = self.begin().await?;
        tx.list_refs(RefSet::UserWishlist, user_id)
            .await
            .map_err(db_err)
    }

    #[instrument(name = "listings.service.get_wishlist_listings", skip(self), fields(user_id = %user_id))]
    pub async fn get_wishlist_listings(&self, user_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        let tx = self.begin().await?;
        let ids = tx
            .list_refs(RefSet::UserWishlist, user_id)
            .await
            .map_err(db_err)?;
        tx.find_listings(&ids).await.map_err(db_err)
    }

    /// Present -> removed, absent -> added (the listing must exist).
    #[instrument(
        name = "listings.service.toggle_wishlist",
        skip(self),
        fields(user_id = %user_id, listing_id = %listing_id)
    )]
    pub async fn toggle_wishlist(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<WishlistToggle, DomainError> {
        let tx = self.begin().await?;
        if tx.find_user(user_id).await.map_err(db_err)?.is_none() {
            return Err(DomainError::user_not_found(user_id));
        }

        let change = if tx
            .pull_ref(RefSet::UserWishlist, user_id, listing_id)
            .await
            .map_err(db_err)?
        {
            WishlistChange::Removed
        } else {
            if tx.find_listing(listing_id).await.map_err(db_err)?.is_none() {
                return Err(DomainError::listing_not_found(listing_id));
            }
            tx.push_ref(RefSet::UserWishlist, user_id, listing_id)
                .await
                .map_err(db_err)?;
            WishlistChange::Added
        };

        let wishlist = tx
            .list_refs(RefSet::UserWishlist, user_id)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!(?change, size = wishlist.len(), "Wishlist toggled");
        Ok(WishlistToggle { change, wishlist })
    }

    // ---------------------------------------------------------------------
    // Listings
    // ---------------------------------------------------------------------

    #[instrument(name = "listings.service.get_listing", skip(self), fields(listing_id = %id))]
    pub async fn get_listing(&self, id: Uuid) -> Result<Listing, DomainError> {
        debug!("Getting listing by id");
        let tx = self.begin().await?;
        tx.find_listing(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::listing_not_found(id))
    }

    /// Blank or missing query returns every listing in insertion order.
    #[instrument(name = "listings.service.search_listings", skip(self))]
    pub async fn search_listings(&self, query: Option<&str>) -> Result<Vec<Listing>, DomainError> {
        let tx = self.begin().await?;
        let listings = match query.filter(|q| !is_blank(q)) {
            None => tx.all_listings().await,
            Some(q) => tx.search_listings(q).await,
        }
        .map_err(db_err)?;
        debug!(count = listings.len(), "Search finished");
        Ok(listings)
    }

    /// Distinct titles, locations and countries of matching listings, sorted.
    #[instrument(name = "listings.service.get_suggestions", skip(self))]
    pub async fn get_suggestions(&self, query: &str) -> Result<Vec<String>, DomainError> {
        if is_blank(query) {
            return Ok(Vec::new());
        }

        let tx = self.begin().await?;
        let listings = tx.match_listing_labels(query).await.map_err(db_err)?;

        let suggestions: BTreeSet<String> = listings
            .into_iter()
            .flat_map(|l| [Some(l.title), l.location, l.country])
            .flatten()
            .filter(|v| !is_blank(v))
            .collect();
        Ok(suggestions.into_iter().collect())
    }

    #[instrument(
        name = "listings.service.create_listing",
        skip(self, new_listing, images),
        fields(owner_id = %owner_id, title = %new_listing.title, images = images.len())
    )]
    pub async fn create_listing(
        &self,
        owner_id: Uuid,
        new_listing: NewListing,
        images: Vec<ImageUpload>,
    ) -> Result<Listing, DomainError> {
        info!("Creating new listing");

        if is_blank(&new_listing.title) {
            return Err(DomainError::validation("title", "Title is required"));
        }
        let price = new_listing
            .price
            .ok_or_else(|| DomainError::validation("price", "Price is required"))?;
        validate_price(price)?;
        self.check_image_count(images.len())?;

        let mut urls = self.upload_images(images).await?;
        if urls.is_empty() {
            urls.push(self.config.placeholder_image.clone());
        }

        let listing = Listing {
            id: Uuid::new_v4(),
            title: new_listing.title,
            description: new_listing.description,
            images: urls,
            price,
            location: new_listing.location,
            country: new_listing.country,
            coordinates: new_listing.coordinates,
            owner: owner_id,
            reviews: Vec::new(),
            created_at: Utc::now(),
        };

        let tx = self.begin().await?;
        if tx.find_user(owner_id).await.map_err(db_err)?.is_none() {
            return Err(DomainError::user_not_found(owner_id));
        }
        tx.insert_listing(&listing).await.map_err(db_err)?;
        tx.push_ref(RefSet::UserListings, owner_id, listing.id)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Successfully created listing with id={}", listing.id);
        Ok(listing)
    }

    /// Owner-only partial update. Images are replaced by
    /// `existing_images ++ uploaded(new_images)` unless both are empty.
    #[instrument(
        name = "listings.service.update_listing",
        skip(self, patch, existing_images, new_images),
        fields(listing_id = %listing_id, actor_id = %actor_id)
    )]
    pub async fn update_listing(
        &self,
        listing_id: Uuid,
        actor_id: Uuid,
        patch: ListingPatch,
        existing_images: Vec<String>,
        new_images: Vec<ImageUpload>,
    ) -> Result<Listing, DomainError> {
        const NOT_OWNER: &str = "You are not authorized to update this listing";
        info!("Updating listing");

        // Authorize before anything is uploaded.
        {
            let tx = self.begin().await?;
            let listing = tx
                .find_listing(listing_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| DomainError::listing_not_found(listing_id))?;
            ensure_owner(&listing, actor_id, NOT_OWNER)?;
        }

        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        let existing_images: Vec<String> = existing_images
            .into_iter()
            .filter(|url| !is_blank(url))
            .collect();
        self.check_image_count(existing_images.len() + new_images.len())?;
        let uploaded = self.upload_images(new_images).await?;

        let tx = self.begin().await?;
        let mut listing = tx
            .find_listing(listing_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::listing_not_found(listing_id))?;
        ensure_owner(&listing, actor_id, NOT_OWNER)?;

        if let Some(title) = non_blank(patch.title) {
            listing.title = title;
        }
        if let Some(description) = patch.description {
            listing.description = Some(description);
        }
        if let Some(price) = patch.price {
            listing.price = price;
        }
        if let Some(location) = non_blank(patch.location) {
            listing.location = Some(location);
        }
        if let Some(country) = non_blank(patch.country) {
            listing.country = Some(country);
        }
        if let (Some(lat), Some(lng)) = (patch.lat, patch.lng) {
            listing.coordinates = Some(GeoPoint { lat, lng });
        }
        if !existing_images.is_empty() || !uploaded.is_empty() {
            listing.images = existing_images.into_iter().chain(uploaded).collect();
        }

        tx.update_listing(&listing).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Successfully updated listing");
        Ok(listing)
    }

    /// Owner-only delete. Also removes the listing's reviews (and their ids
    /// from the authors' review sets) and every wishlist entry naming it.
    #[instrument(
        name = "listings.service.delete_listing",
        skip(self),
        fields(listing_id = %listing_id, actor_id = %actor_id)
    )]
    pub async fn delete_listing(&self, listing_id: Uuid, actor_id: Uuid) -> Result<(), DomainError> {
        info!("Deleting listing");

        let tx = self.begin().await?;
        let listing = tx
            .find_listing(listing_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::listing_not_found(listing_id))?;
        ensure_owner(&listing, actor_id, "You are not authorized to delete this listing")?;

        tx.pull_ref(RefSet::UserListings, listing.owner, listing_id)
            .await
            .map_err(db_err)?;

        let reviews = tx.reviews_for_listing(listing_id).await.map_err(db_err)?;
        for review in &reviews {
            tx.pull_ref(RefSet::UserReviews, review.author, review.id)
                .await
                .map_err(db_err)?;
            tx.pull_ref(RefSet::ListingReviews, listing_id, review.id)
                .await
                .map_err(db_err)?;
            tx.delete_review(review.id).await.map_err(db_err)?;
        }

        let wishlists = tx
            .pull_target(RefSet::UserWishlist, listing_id)
            .await
            .map_err(db_err)?;

        if !tx.delete_listing(listing_id).await.map_err(db_err)? {
            warn!("Listing row vanished during delete");
        }
        tx.commit().await.map_err(db_err)?;

        info!(
            reviews = reviews.len(),
            wishlists, "Successfully deleted listing"
        );
        Ok(())
    }

    fn check_image_count(&self, count: usize) -> Result<(), DomainError> {
        if count > self.config.max_images_per_listing {
            return Err(DomainError::validation(
                "images",
                format!(
                    "At most {} images are allowed per listing",
                    self.config.max_images_per_listing
                ),
            ));
        }
        Ok(())
    }

    async fn upload_images(&self, uploads: Vec<ImageUpload>) -> Result<Vec<String>, DomainError> {
        let mut urls = Vec::with_capacity(uploads.len());
        for image in uploads {
            let url = self.images.upload(image).await?;
            debug!(%url, "Image uploaded");
            urls.push(url);
        }
        Ok(urls)
    }

    // ---------------------------------------------------------------------
    // Reviews
    // ---------------------------------------------------------------------

    #[instrument(
        name = "listings.service.create_review",
        skip(self, new_review),
        fields(author_id = %author_id, listing_id = %new_review.listing, rating = new_review.rating)
    )]
    pub async fn create_review(
        &self,
        author_id: Uuid,
        new_review: NewReview,
    ) -> Result<Review, DomainError> {
        info!("Creating review");

        validate_rating(new_review.rating)?;
        if is_blank(&new_review.comment) {
            return Err(DomainError::validation("comment", "All fields are required"));
        }

        let tx = self.begin().await?;
        if tx
            .find_listing(new_review.listing)
            .await
            .map_err(db_err)?
            .is_none()
        {
            return Err(DomainError::listing_not_found(new_review.listing));
        }
        if tx.find_user(author_id).await.map_err(db_err)?.is_none() {
            return Err(DomainError::user_not_found(author_id));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            listing: new_review.listing,
            author: author_id,
            rating: new_review.rating,
            comment: new_review.comment,
            created_at: now,
            updated_at: now,
        };
        tx.insert_review(&review).await.map_err(db_err)?;
        tx.push_ref(RefSet::ListingReviews, review.listing, review.id)
            .await
            .map_err(db_err)?;
        tx.push_ref(RefSet::UserReviews, author_id, review.id)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Successfully created review with id={}", review.id);
        Ok(review)
    }

    #[instrument(name = "listings.service.get_review", skip(self), fields(review_id = %id))]
    pub async fn get_review(&self, id: Uuid) -> Result<Review, DomainError> {
        let tx = self.begin().await?;
        tx.find_review(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::review_not_found(id))
    }

    /// Reviews of a listing, oldest first, with a public slice of each author.
    #[instrument(name = "listings.service.list_reviews", skip(self), fields(listing_id = %listing_id))]
    pub async fn list_reviews(&self, listing_id: Uuid) -> Result<Vec<ReviewWithAuthor>, DomainError> {
        let tx = self.begin().await?;
        let reviews = tx.reviews_for_listing(listing_id).await.map_err(db_err)?;

        let author_ids: Vec<Uuid> = reviews
            .iter()
            .map(|r| r.author)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let authors: HashMap<Uuid, AuthorSummary> = tx
            .find_users(&author_ids)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    AuthorSummary {
                        id: u.id,
                        username: u.username,
                        gmail: u.gmail,
                    },
                )
            })
            .collect();

        Ok(reviews
            .into_iter()
            .map(|review| ReviewWithAuthor {
                author: authors.get(&review.author).cloned(),
                review,
            })
            .collect())
    }

    /// Author-only partial update; rating and comment are re-validated.
    #[instrument(
        name = "listings.service.update_review",
        skip(self, patch),
        fields(review_id = %review_id, actor_id = %actor_id)
    )]
    pub async fn update_review(
        &self,
        review_id: Uuid,
        actor_id: Uuid,
        patch: ReviewPatch,
    ) -> Result<Review, DomainError> {
        info!("Updating review");

        let tx = self.begin().await?;
        let mut review = tx
            .find_review(review_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::review_not_found(review_id))?;
        if review.author != actor_id {
            return Err(DomainError::forbidden("Not authorized"));
        }

        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
            review.rating = rating;
        }
        if let Some(comment) = patch.comment {
            if is_blank(&comment) {
                return Err(DomainError::validation("comment", "Comment cannot be empty"));
            }
            review.comment = comment;
        }
        review.updated_at = Utc::now();

        tx.update_review(&review).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(review)
    }

    #[instrument(
        name = "listings.service.delete_review",
        skip(self),
        fields(review_id = %review_id, actor_id = %actor_id)
    )]
    pub async fn delete_review(&self, review_id: Uuid, actor_id: Uuid) -> Result<(), DomainError> {
        info!("Deleting review");

        let tx = self.begin().await?;
        let review = tx
            .find_review(review_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::review_not_found(review_id))?;
        if review.author != actor_id {
            return Err(DomainError::forbidden("Not authorized"));
        }

        tx.delete_review(review_id).await.map_err(db_err)?;
        tx.pull_ref(RefSet::ListingReviews, review.listing, review_id)
            .await
            .map_err(db_err)?;
        tx.pull_ref(RefSet::UserReviews, review.author, review_id)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!("Successfully deleted review");
        Ok(())
    }
}

/// `base`, then `base1`, `base2`, ... until one is free.
async fn unique_username(tx: &dyn MarketTx, base: &str) -> Result<String, DomainError> {
    for n in 0u64.. {
        let candidate = if n == 0 {
            base.to_string()
        } else {
            format!("{base}{n}")
        };
        if !tx.username_exists(&candidate).await.map_err(db_err)? {
            return Ok(candidate);
        }
    }
    Err(DomainError::internal("username space exhausted"))
}

async fn load_profile(tx: &dyn MarketTx, user: User) -> Result<Profile, DomainError> {
    let listing_ids = tx
        .list_refs(RefSet::UserListings, user.id)
        .await
        .map_err(db_err)?;
    let reviews = tx
        .list_refs(RefSet::UserReviews, user.id)
        .await
        .map_err(db_err)?;
    let wishlist_ids = tx
        .list_refs(RefSet::UserWishlist, user.id)
        .await
        .map_err(db_err)?;

    let listings = tx.find_listings(&listing_ids).await.map_err(db_err)?;
    let wishlist = tx.find_listings(&wishlist_ids).await.map_err(db_err)?;

    Ok(Profile {
        user,
        listings,
        reviews,
        wishlist,
    })
}

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// All listings routes with the service installed as an extension.
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        // Users and credentials
        .route("/api/users/register", post(handlers::register))
        .route("/api/users/login", post(handlers::login))
        .route("/api/users/google-auth", post(handlers::google_auth))
        .route("/api/users/me", get(handlers::me))
        .route("/api/users/update", put(handlers::update_profile))
        .route("/api/users/listings", get(handlers::my_listings))
        .route(
            "/api/users/wishlist",
            get(handlers::wishlist_ids).post(handlers::toggle_wishlist),
        )
        .route("/api/users/account/wishlist", get(handlers::wishlist_listings))
        // Listings
        .route(
            "/api/listings",
            get(handlers::list_listings).post(handlers::create_listing),
        )
        .route("/api/listings/suggestions", get(handlers::suggestions))
        .route(
            "/api/listings/{id}",
            get(handlers::get_listing)
                .put(handlers::update_listing)
                .delete(handlers::delete_listing),
        )
        // Reviews; GET takes a listing id, PUT/DELETE a review id
        .route("/api/reviews", post(handlers::create_review))
        .route(
            "/api/reviews/{id}",
            get(handlers::list_reviews)
                .put(handlers::update_review)
                .delete(handlers::delete_review),
        )
        .layer(Extension(service))
}

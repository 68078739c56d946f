use std::sync::Arc;

use api_ingress::AppError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        multipart::MultipartRejection,
        Multipart, Path, Query,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::auth::AuthUser;
use crate::api::rest::dto::{
    CreateReviewReq, CredentialsReq, GoogleAuthReq, ListedReviewDto, ListingDto, MessageDto,
    ProfileDto, RegisteredDto, ReviewDto, SearchQuery, TokenDto, UpdateProfileReq,
    UpdateReviewReq, WishlistDto, WishlistReq,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::multipart::read_listing_form;
use crate::contract::model::NewReview;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

type Svc = Extension<Arc<Service>>;
type ApiResult<T> = Result<T, AppError>;

/// Log server-side failures once, with context, before mapping them.
fn log_failure(context: &str) -> impl FnOnce(DomainError) -> AppError + '_ {
    move |e| {
        if matches!(
            e,
            DomainError::Database { .. } | DomainError::Upstream { .. } | DomainError::Internal { .. }
        ) {
            error!("{context}: {e}");
        }
        map_domain_error(e)
    }
}

fn invalid_number(value: String) -> AppError {
    AppError::BadRequest(format!("Invalid number: {value}"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn register(
    Extension(svc): Svc,
    payload: Result<Json<CredentialsReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisteredDto>)> {
    let Json(req) = payload?;
    let session = svc
        .register(&req.username, &req.password)
        .await
        .map_err(log_failure("Failed to register user"))?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredDto {
            message: "Registration successful".to_string(),
            token: session.token,
        }),
    ))
}

pub async fn login(
    Extension(svc): Svc,
    payload: Result<Json<CredentialsReq>, JsonRejection>,
) -> ApiResult<Json<TokenDto>> {
    let Json(req) = payload?;
    let session = svc
        .login(&req.username, &req.password)
        .await
        .map_err(log_failure("Failed to log in"))?;
    Ok(Json(TokenDto {
        token: session.token,
    }))
}

pub async fn google_auth(
    Extension(svc): Svc,
    payload: Result<Json<GoogleAuthReq>, JsonRejection>,
) -> ApiResult<Json<TokenDto>> {
    let Json(req) = payload?;
    let session = svc
        .authenticate_external(&req.token)
        .await
        .map_err(log_failure("Google authentication failed"))?;
    Ok(Json(TokenDto {
        token: session.token,
    }))
}

pub async fn me(Extension(svc): Svc, AuthUser(user): AuthUser) -> ApiResult<Json<ProfileDto>> {
    let profile = svc
        .get_profile(user.id)
        .await
        .map_err(log_failure("Failed to fetch profile"))?;
    Ok(Json(profile.into()))
}

pub async fn update_profile(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    payload: Result<Json<UpdateProfileReq>, JsonRejection>,
) -> ApiResult<Json<ProfileDto>> {
    let Json(req) = payload?;
    info!(user_id = %user.id, "Updating profile");
    let profile = svc
        .update_profile(user.id, req.into())
        .await
        .map_err(log_failure("Failed to update profile"))?;
    Ok(Json(profile.into()))
}

pub async fn my_listings(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ListingDto>>> {
    let listings = svc
        .list_owned_listings(user.id)
        .await
        .map_err(log_failure("Failed to fetch user listings"))?;
    Ok(Json(listings.into_iter().map(ListingDto::from).collect()))
}

pub async fn wishlist_ids(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<WishlistDto>> {
    let wishlist = svc
        .get_wishlist(user.id)
        .await
        .map_err(log_failure("Failed to fetch wishlist"))?;
    Ok(Json(WishlistDto { wishlist }))
}

pub async fn toggle_wishlist(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    payload: Result<Json<WishlistReq>, JsonRejection>,
) -> ApiResult<Json<WishlistDto>> {
    let Json(req) = payload?;
    let toggled = svc
        .toggle_wishlist(user.id, req.listing_id)
        .await
        .map_err(log_failure("Failed to update wishlist"))?;
    Ok(Json(WishlistDto {
        wishlist: toggled.wishlist,
    }))
}

pub async fn wishlist_listings(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ListingDto>>> {
    let listings = svc
        .get_wishlist_listings(user.id)
        .await
        .map_err(log_failure("Failed to fetch wishlist"))?;
    Ok(Json(listings.into_iter().map(ListingDto::from).collect()))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

pub async fn list_listings(
    Extension(svc): Svc,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ListingDto>>> {
    let Query(query) = query?;
    let listings = svc
        .search_listings(query.search.as_deref())
        .await
        .map_err(log_failure("Failed to search listings"))?;
    Ok(Json(listings.into_iter().map(ListingDto::from).collect()))
}

pub async fn suggestions(
    Extension(svc): Svc,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<String>>> {
    let Query(query) = query?;
    let suggestions = svc
        .get_suggestions(query.search.as_deref().unwrap_or_default())
        .await
        .map_err(log_failure("Failed to build suggestions"))?;
    Ok(Json(suggestions))
}

pub async fn get_listing(
    Extension(svc): Svc,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ListingDto>> {
    let Path(id) = path?;
    let listing = svc
        .get_listing(id)
        .await
        .map_err(log_failure("Failed to fetch listing"))?;
    Ok(Json(listing.into()))
}

pub async fn create_listing(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<ListingDto>)> {
    let form = read_listing_form(multipart?).await?;
    let new_listing = form.data.into_new_listing().map_err(invalid_number)?;

    let listing = svc
        .create_listing(user.id, new_listing, form.images)
        .await
        .map_err(log_failure("Failed to create listing"))?;
    Ok((StatusCode::CREATED, Json(listing.into())))
}

pub async fn update_listing(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ListingDto>> {
    let Path(id) = path?;
    let form = read_listing_form(multipart?).await?;
    let patch = form.data.into_patch().map_err(invalid_number)?;

    let listing = svc
        .update_listing(id, user.id, patch, form.existing_images, form.images)
        .await
        .map_err(log_failure("Failed to update listing"))?;
    Ok(Json(listing.into()))
}

pub async fn delete_listing(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageDto>> {
    let Path(id) = path?;
    svc.delete_listing(id, user.id)
        .await
        .map_err(log_failure("Failed to delete listing"))?;
    Ok(Json(MessageDto::new("Listing deleted successfully")))
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

pub async fn create_review(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateReviewReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReviewDto>)> {
    let Json(req) = payload?;
    let (Some(listing), Some(rating), Some(comment)) = (req.listing, req.rating, req.comment) else {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    };

    let review = svc
        .create_review(
            user.id,
            NewReview {
                listing,
                rating,
                comment,
            },
        )
        .await
        .map_err(log_failure("Failed to create review"))?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

pub async fn list_reviews(
    Extension(svc): Svc,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<ListedReviewDto>>> {
    let Path(listing_id) = path?;
    let reviews = svc
        .list_reviews(listing_id)
        .await
        .map_err(log_failure("Failed to fetch reviews"))?;
    Ok(Json(reviews.into_iter().map(ListedReviewDto::from).collect()))
}

pub async fn update_review(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReviewReq>, JsonRejection>,
) -> ApiResult<Json<ReviewDto>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let review = svc
        .update_review(id, user.id, req.into())
        .await
        .map_err(log_failure("Failed to update review"))?;
    Ok(Json(review.into()))
}

pub async fn delete_review(
    Extension(svc): Svc,
    AuthUser(user): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageDto>> {
    let Path(id) = path?;
    svc.delete_review(id, user.id)
        .await
        .map_err(log_failure("Failed to delete review"))?;
    Ok(Json(MessageDto::new("Review deleted successfully")))
}

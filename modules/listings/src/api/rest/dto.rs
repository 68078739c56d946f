use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{
    AuthorSummary, GeoPoint, Listing, ListingPatch, NewListing, Profile, ProfilePatch, Review,
    ReviewPatch, ReviewWithAuthor,
};

/// REST DTO for a listing. Field names follow the web client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: f64,
    pub location: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "locationCoOrdinates", skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPointDto>,
    pub owner: Uuid,
    pub reviews: Vec<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPointDto {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub listing: Uuid,
    pub user: Uuid,
    pub rating: i32,
    pub comment: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: Option<String>,
    pub gmail: Option<String>,
}

/// A review as listed under its listing, with the author populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedReviewDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub listing: Uuid,
    pub user: Option<AuthorDto>,
    pub rating: i32,
    pub comment: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The caller's own account. Never carries credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub gmail: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
    pub name: Option<String>,
    pub joining_date: DateTime<Utc>,
    pub user_listings: Vec<ListingDto>,
    pub user_reviews: Vec<Uuid>,
    pub user_wishlist: Vec<ListingDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredDto {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistDto {
    pub wishlist: Vec<Uuid>,
}

// Requests

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleAuthReq {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileReq {
    pub gmail: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WishlistReq {
    #[serde(rename = "listingId")]
    pub listing_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateReviewReq {
    pub listing: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateReviewReq {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Browsers send form numbers as strings; JSON clients send numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// `Ok(None)` for an empty string, `Err` for text that is not a number.
    pub fn to_f64(&self) -> Result<Option<f64>, String> {
        match self {
            NumberOrString::Number(n) => Ok(Some(*n)),
            NumberOrString::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrString::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| s.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoordinatesReq {
    pub lat: Option<NumberOrString>,
    pub lng: Option<NumberOrString>,
}

/// The `listingData` part of a listing form, or the equivalent plain fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingDataReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<NumberOrString>,
    pub location: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "locationCoOrdinates")]
    pub coordinates: Option<CoordinatesReq>,
}

impl ListingDataReq {
    pub fn price(&self) -> Result<Option<f64>, String> {
        match &self.price {
            Some(p) => p.to_f64(),
            None => Ok(None),
        }
    }

    fn lat_lng(&self) -> Result<(Option<f64>, Option<f64>), String> {
        let Some(c) = &self.coordinates else {
            return Ok((None, None));
        };
        let lat = c.lat.as_ref().map(NumberOrString::to_f64).transpose()?.flatten();
        let lng = c.lng.as_ref().map(NumberOrString::to_f64).transpose()?.flatten();
        Ok((lat, lng))
    }

    pub fn into_new_listing(self) -> Result<NewListing, String> {
        let price = self.price()?;
        let (lat, lng) = self.lat_lng()?;
        Ok(NewListing {
            title: self.title.unwrap_or_default(),
            description: self.description,
            price,
            location: self.location,
            country: self.country,
            coordinates: lat.zip(lng).map(|(lat, lng)| GeoPoint { lat, lng }),
        })
    }

    pub fn into_patch(self) -> Result<ListingPatch, String> {
        let price = self.price()?;
        let (lat, lng) = self.lat_lng()?;
        Ok(ListingPatch {
            title: self.title,
            description: self.description,
            price,
            location: self.location,
            country: self.country,
            lat,
            lng,
        })
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<GeoPoint> for GeoPointDto {
    fn from(p: GeoPoint) -> Self {
        Self { lat: p.lat, lng: p.lng }
    }
}

impl From<Listing> for ListingDto {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            title: l.title,
            description: l.description,
            images: l.images,
            price: l.price,
            location: l.location,
            country: l.country,
            coordinates: l.coordinates.map(GeoPointDto::from),
            owner: l.owner,
            reviews: l.reviews,
            created_at: l.created_at,
        }
    }
}

impl From<Review> for ReviewDto {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            listing: r.listing,
            user: r.author,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<AuthorSummary> for AuthorDto {
    fn from(a: AuthorSummary) -> Self {
        Self {
            id: a.id,
            username: a.username,
            gmail: a.gmail,
        }
    }
}

impl From<ReviewWithAuthor> for ListedReviewDto {
    fn from(r: ReviewWithAuthor) -> Self {
        let ReviewWithAuthor { review, author } = r;
        Self {
            id: review.id,
            listing: review.listing,
            user: author.map(AuthorDto::from),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

impl From<Profile> for ProfileDto {
    fn from(p: Profile) -> Self {
        let user = p.user;
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            gmail: user.gmail,
            phone_no: user.phone_no,
            address: user.address,
            profile_picture: user.profile_picture,
            name: user.name,
            joining_date: user.joined_at,
            user_listings: p.listings.into_iter().map(ListingDto::from).collect(),
            user_reviews: p.reviews,
            user_wishlist: p.wishlist.into_iter().map(ListingDto::from).collect(),
        }
    }
}

impl From<UpdateProfileReq> for ProfilePatch {
    fn from(req: UpdateProfileReq) -> Self {
        Self {
            gmail: req.gmail,
            phone_no: req.phone_no,
            address: req.address,
        }
    }
}

impl From<UpdateReviewReq> for ReviewPatch {
    fn from(req: UpdateReviewReq) -> Self {
        Self {
            rating: req.rating,
            comment: req.comment,
        }
    }
}

//! Conversions between SeaORM rows and contract models.

use anyhow::{bail, Context};
use sea_orm::Set;
use uuid::Uuid;

use crate::contract::model::{Credential, GeoPoint, Listing, Review, User};
use crate::infra::storage::entity::{listing, review, user};

/// Rows violating the single-credential rule are reported, not guessed at.
pub fn user_from_model(m: user::Model) -> anyhow::Result<User> {
    let credential = match (m.password_hash, m.google_id) {
        (Some(hash), None) => Credential::Password { hash },
        (None, Some(subject)) => Credential::Google { subject },
        (hash, google) => bail!(
            "user {} has an invalid credential (password: {}, google: {})",
            m.id,
            hash.is_some(),
            google.is_some()
        ),
    };
    Ok(User {
        id: m.id,
        username: m.username,
        credential,
        email: m.email,
        gmail: m.gmail,
        phone_no: m.phone_no,
        address: m.address,
        profile_picture: m.profile_picture,
        name: m.name,
        joined_at: m.joined_at,
    })
}

pub fn user_to_active(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id),
        username: Set(u.username.clone()),
        password_hash: Set(u.password_hash().map(str::to_owned)),
        google_id: Set(u.google_id().map(str::to_owned)),
        email: Set(u.email.clone()),
        gmail: Set(u.gmail.clone()),
        phone_no: Set(u.phone_no.clone()),
        address: Set(u.address.clone()),
        profile_picture: Set(u.profile_picture.clone()),
        name: Set(u.name.clone()),
        joined_at: Set(u.joined_at),
    }
}

pub fn listing_from_model(m: listing::Model, reviews: Vec<Uuid>) -> anyhow::Result<Listing> {
    let images: Vec<String> = serde_json::from_value(m.images)
        .with_context(|| format!("listing {} has malformed images", m.id))?;
    let coordinates = match (m.lat, m.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };
    Ok(Listing {
        id: m.id,
        title: m.title,
        description: m.description,
        images,
        price: m.price,
        location: m.location,
        country: m.country,
        coordinates,
        owner: m.owner_id,
        reviews,
        created_at: m.created_at,
    })
}

/// Search columns are folded here with full Unicode lowercasing; the
/// database's own `lower()` only folds ASCII on SQLite.
fn folded_search_columns(l: &Listing) -> (String, String) {
    let labels = [Some(&l.title), l.location.as_ref(), l.country.as_ref()]
        .into_iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    let text = match &l.description {
        Some(d) => format!("{labels}\n{}", d.to_lowercase()),
        None => labels.clone(),
    };
    (labels, text)
}

pub fn listing_to_active(l: &Listing) -> anyhow::Result<listing::ActiveModel> {
    let (labels_folded, text_folded) = folded_search_columns(l);
    Ok(listing::ActiveModel {
        id: Set(l.id),
        title: Set(l.title.clone()),
        description: Set(l.description.clone()),
        images: Set(serde_json::to_value(&l.images).context("serializing images")?),
        price: Set(l.price),
        location: Set(l.location.clone()),
        country: Set(l.country.clone()),
        lat: Set(l.coordinates.map(|c| c.lat)),
        lng: Set(l.coordinates.map(|c| c.lng)),
        owner_id: Set(l.owner),
        created_at: Set(l.created_at),
        labels_folded: Set(labels_folded),
        text_folded: Set(text_folded),
    })
}

pub fn review_from_model(m: review::Model) -> Review {
    Review {
        id: m.id,
        listing: m.listing_id,
        author: m.author_id,
        rating: m.rating,
        comment: m.comment,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub fn review_to_active(r: &Review) -> review::ActiveModel {
    review::ActiveModel {
        id: Set(r.id),
        listing_id: Set(r.listing),
        author_id: Set(r.author),
        rating: Set(r.rating),
        comment: Set(r.comment.clone()),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

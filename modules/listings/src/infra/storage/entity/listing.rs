use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// JSON array of image URLs, in display order.
    pub images: Json,
    pub price: f64,
    pub location: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Lowercased title, location and country, one per line.
    pub labels_folded: String,
    /// `labels_folded` plus the lowercased description.
    pub text_folded: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Exactly one of `password_hash` / `google_id` is set; the mapper enforces it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: Option<String>,
    pub password_hash: Option<String>,
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub gmail: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

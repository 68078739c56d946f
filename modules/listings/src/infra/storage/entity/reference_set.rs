use sea_orm::entity::prelude::*;

/// One member of an ordered id set. `id` keeps insertion order;
/// `(set_kind, owner_id, target_id)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reference_sets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub set_kind: String,
    pub owner_id: Uuid,
    pub target_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! SeaORM-backed implementation of the persistence ports.
//!
//! `SeaOrmRepo` is generic over `C: ConnectionTrait`, so it runs on a plain
//! `DatabaseConnection` or on a `DatabaseTransaction`. `SeaOrmStore` hands out
//! the transactional flavour, one per service operation.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::contract::model::{Listing, Review, User};
use crate::domain::repo::{
    DuplicateKey, ListingsRepository, MarketStore, MarketTx, RefSet, ReferenceSets,
    ReviewsRepository, UsersRepository,
};
use crate::infra::storage::entity::{listing, reference_set, review, user};
use crate::infra::storage::mapper;

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
    // Held until commit or drop on SQLite, see `SeaOrmStore`.
    _turn: Option<OwnedMutexGuard<()>>,
}

impl<C> SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn, _turn: None }
    }
}

/// `%needle%` for LIKE, lowercased, with LIKE wildcards escaped so the query
/// is matched literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn folded_contains(column: listing::Column, pattern: &str) -> SimpleExpr {
    Expr::col(column).like(LikeExpr::new(pattern).escape('\\'))
}

fn ref_kind(set: RefSet) -> Condition {
    Condition::all().add(reference_set::Column::SetKind.eq(set.as_str()))
}

impl<C> SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync,
{
    /// Turn listing rows into models with their review sets attached.
    async fn with_reviews(&self, rows: Vec<listing::Model>) -> anyhow::Result<Vec<Listing>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let refs = reference_set::Entity::find()
            .filter(
                ref_kind(RefSet::ListingReviews).add(reference_set::Column::OwnerId.is_in(ids)),
            )
            .order_by_asc(reference_set::Column::Id)
            .all(&self.conn)
            .await
            .context("loading listing reviews failed")?;

        let mut by_listing: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for r in refs {
            by_listing.entry(r.owner_id).or_default().push(r.target_id);
        }

        rows.into_iter()
            .map(|row| {
                let reviews = by_listing.remove(&row.id).unwrap_or_default();
                mapper::listing_from_model(row, reviews)
            })
            .collect()
    }

    async fn listings_where(&self, cond: Condition) -> anyhow::Result<Vec<Listing>> {
        let rows = listing::Entity::find()
            .filter(cond)
            .order_by_asc(listing::Column::CreatedAt)
            .order_by_asc(listing::Column::Id)
            .all(&self.conn)
            .await
            .context("listing query failed")?;
        self.with_reviews(rows).await
    }

    async fn find_user_where(&self, cond: Condition) -> anyhow::Result<Option<User>> {
        user::Entity::find()
            .filter(cond)
            .one(&self.conn)
            .await
            .context("user query failed")?
            .map(mapper::user_from_model)
            .transpose()
    }
}

#[async_trait]
impl<C> UsersRepository for SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_user failed")?
            .map(mapper::user_from_model)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_user_where(Condition::all().add(user::Column::Username.eq(username)))
            .await
    }

    async fn find_user_by_google_id(&self, subject: &str) -> anyhow::Result<Option<User>> {
        self.find_user_where(Condition::all().add(user::Column::GoogleId.eq(subject)))
            .await
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("username_exists failed")?;
        Ok(count > 0)
    }

    async fn find_users(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("find_users failed")?
            .into_iter()
            .map(mapper::user_from_model)
            .collect()
    }

    async fn insert_user(&self, u: &User) -> anyhow::Result<()> {
        match mapper::user_to_active(u).insert(&self.conn).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DuplicateKey { table: "users" }.into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert_user failed")),
        }
    }

    async fn update_user(&self, u: &User) -> anyhow::Result<()> {
        let _ = mapper::user_to_active(u)
            .update(&self.conn)
            .await
            .context("update_user failed")?;
        Ok(())
    }
}

#[async_trait]
impl<C> ListingsRepository for SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_listing(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        let Some(row) = listing::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_listing failed")?
        else {
            return Ok(None);
        };
        Ok(self.with_reviews(vec![row]).await?.pop())
    }

    async fn find_listings(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Listing>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self
            .listings_where(Condition::all().add(listing::Column::Id.is_in(ids.iter().copied())))
            .await?;

        let mut by_id: HashMap<Uuid, Listing> = found.into_iter().map(|l| (l.id, l)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn all_listings(&self) -> anyhow::Result<Vec<Listing>> {
        self.listings_where(Condition::all()).await
    }

    async fn search_listings(&self, needle: &str) -> anyhow::Result<Vec<Listing>> {
        let pattern = contains_pattern(needle);
        self.listings_where(
            Condition::all().add(folded_contains(listing::Column::TextFolded, &pattern)),
        )
        .await
    }

    async fn match_listing_labels(&self, needle: &str) -> anyhow::Result<Vec<Listing>> {
        let pattern = contains_pattern(needle);
        self.listings_where(
            Condition::all().add(folded_contains(listing::Column::LabelsFolded, &pattern)),
        )
        .await
    }

    async fn listings_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Listing>> {
        self.listings_where(Condition::all().add(listing::Column::OwnerId.eq(owner)))
            .await
    }

    async fn insert_listing(&self, l: &Listing) -> anyhow::Result<()> {
        let _ = mapper::listing_to_active(l)?
            .insert(&self.conn)
            .await
            .context("insert_listing failed")?;
        Ok(())
    }

    async fn update_listing(&self, l: &Listing) -> anyhow::Result<()> {
        let _ = mapper::listing_to_active(l)?
            .update(&self.conn)
            .await
            .context("update_listing failed")?;
        Ok(())
    }

    async fn delete_listing(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = listing::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete_listing failed")?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl<C> ReviewsRepository for SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_review(&self, id: Uuid) -> anyhow::Result<Option<Review>> {
        let found = review::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_review failed")?;
        Ok(found.map(mapper::review_from_model))
    }

    async fn reviews_for_listing(&self, listing_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let rows = review::Entity::find()
            .filter(review::Column::ListingId.eq(listing_id))
            .order_by_asc(review::Column::CreatedAt)
            .order_by_asc(review::Column::Id)
            .all(&self.conn)
            .await
            .context("reviews_for_listing failed")?;
        Ok(rows.into_iter().map(mapper::review_from_model).collect())
    }

    async fn insert_review(&self, r: &Review) -> anyhow::Result<()> {
        let _ = mapper::review_to_active(r)
            .insert(&self.conn)
            .await
            .context("insert_review failed")?;
        Ok(())
    }

    async fn update_review(&self, r: &Review) -> anyhow::Result<()> {
        let _ = mapper::review_to_active(r)
            .update(&self.conn)
            .await
            .context("update_review failed")?;
        Ok(())
    }

    async fn delete_review(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = review::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete_review failed")?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl<C> ReferenceSets for SeaOrmRepo<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn push_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<()> {
        if self.contains_ref(set, owner, target).await? {
            return Ok(());
        }
        let m = reference_set::ActiveModel {
            set_kind: Set(set.as_str().to_string()),
            owner_id: Set(owner),
            target_id: Set(target),
            ..Default::default()
        };
        let _ = m
            .insert(&self.conn)
            .await
            .with_context(|| format!("push_ref {} failed", set.as_str()))?;
        Ok(())
    }

    async fn pull_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<bool> {
        let res = reference_set::Entity::delete_many()
            .filter(
                ref_kind(set)
                    .add(reference_set::Column::OwnerId.eq(owner))
                    .add(reference_set::Column::TargetId.eq(target)),
            )
            .exec(&self.conn)
            .await
            .with_context(|| format!("pull_ref {} failed", set.as_str()))?;
        Ok(res.rows_affected > 0)
    }

    async fn contains_ref(&self, set: RefSet, owner: Uuid, target: Uuid) -> anyhow::Result<bool> {
        let count = reference_set::Entity::find()
            .filter(
                ref_kind(set)
                    .add(reference_set::Column::OwnerId.eq(owner))
                    .add(reference_set::Column::TargetId.eq(target)),
            )
            .count(&self.conn)
            .await
            .with_context(|| format!("contains_ref {} failed", set.as_str()))?;
        Ok(count > 0)
    }

    async fn list_refs(&self, set: RefSet, owner: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let rows = reference_set::Entity::find()
            .filter(ref_kind(set).add(reference_set::Column::OwnerId.eq(owner)))
            .order_by_asc(reference_set::Column::Id)
            .all(&self.conn)
            .await
            .with_context(|| format!("list_refs {} failed", set.as_str()))?;
        Ok(rows.into_iter().map(|r| r.target_id).collect())
    }

    async fn pull_target(&self, set: RefSet, target: Uuid) -> anyhow::Result<u64> {
        let res = reference_set::Entity::delete_many()
            .filter(ref_kind(set).add(reference_set::Column::TargetId.eq(target)))
            .exec(&self.conn)
            .await
            .with_context(|| format!("pull_target {} failed", set.as_str()))?;
        Ok(res.rows_affected)
    }
}

#[async_trait]
impl MarketTx for SeaOrmRepo<DatabaseTransaction> {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let Self { conn, _turn } = *self;
        conn.commit().await.context("commit failed")
    }
}

/// Hands out one transaction-scoped repository per unit of work.
///
/// SQLite transactions start deferred and upgrade to a write lock on their
/// first write; two overlapping upgrades fail with `SQLITE_BUSY` without
/// waiting on `busy_timeout`. On SQLite the store therefore runs one
/// transaction at a time. Postgres transactions run concurrently.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    turns: Option<Arc<Mutex<()>>>,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let turns = (db.get_database_backend() == DbBackend::Sqlite)
            .then(|| Arc::new(Mutex::new(())));
        Self { db, turns }
    }
}

#[async_trait]
impl MarketStore for SeaOrmStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn MarketTx>> {
        let turn = match &self.turns {
            Some(turns) => Some(turns.clone().lock_owned().await),
            None => None,
        };
        let tx = self.db.begin().await.context("begin transaction failed")?;
        Ok(Box::new(SeaOrmRepo { conn: tx, _turn: turn }))
    }
}

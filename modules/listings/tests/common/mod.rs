#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use runtime::config::DatabaseConfig;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use listings::contract::model::{ImageUpload, NewListing};
use listings::domain::error::DomainError;
use listings::domain::ports::{ExternalIdentity, IdentityVerifier, ImageStore};
use listings::domain::repo::{MarketStore, MarketTx, RefSet, ReferenceSets};
use listings::domain::service::{Service, ServiceConfig};
use listings::infra::auth::{Argon2Hasher, JwtTokenIssuer};
use listings::infra::storage::{migrations::Migrator, SeaOrmStore};

pub const TEST_SECRET: &str = "test-secret";

/// Image store double: hands out predictable URLs and remembers what it got.
#[derive(Default)]
pub struct RecordingImages {
    pub uploaded: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl ImageStore for RecordingImages {
    async fn upload(&self, image: ImageUpload) -> Result<String, DomainError> {
        if *self.fail.lock() {
            return Err(DomainError::upstream("images", "unavailable"));
        }
        let mut uploaded = self.uploaded.lock();
        uploaded.push(image.file_name.clone());
        Ok(format!(
            "https://img.test/{}/{}",
            uploaded.len(),
            image.file_name
        ))
    }
}

/// Identity provider double keyed by the raw ID token.
#[derive(Default)]
pub struct StaticIdentities {
    pub tokens: Mutex<HashMap<String, ExternalIdentity>>,
}

impl StaticIdentities {
    pub fn add(&self, token: &str, subject: &str, email: Option<&str>, name: Option<&str>) {
        self.tokens.lock().insert(
            token.to_string(),
            ExternalIdentity {
                subject: subject.to_string(),
                email: email.map(str::to_string),
                name: name.map(str::to_string),
                picture: Some(format!("https://pics.test/{subject}.png")),
            },
        );
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentities {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, DomainError> {
        self.tokens
            .lock()
            .get(id_token)
            .cloned()
            .ok_or_else(|| DomainError::identity_rejected("unknown test token"))
    }
}

pub struct TestCtx {
    pub db: DatabaseConnection,
    pub store: Arc<SeaOrmStore>,
    pub service: Arc<Service>,
    pub images: Arc<RecordingImages>,
    pub identities: Arc<StaticIdentities>,
}

impl TestCtx {
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let db = runtime::db::connect_memory()
            .await
            .expect("Failed to connect to test database");
        Self::with_db(db, config).await
    }

    /// File-backed SQLite under `dir`, opened the way the server opens it.
    pub async fn on_disk(dir: &Path) -> Self {
        let cfg = DatabaseConfig {
            url: "sqlite://roost.db".to_string(),
            ..Default::default()
        };
        let dsn = runtime::db::resolve_dsn(&cfg, dir, false).expect("resolve dsn");
        let db = runtime::db::connect(&dsn, &cfg)
            .await
            .expect("Failed to connect to test database");
        Self::with_db(db, ServiceConfig::default()).await
    }

    pub async fn with_db(db: DatabaseConnection, config: ServiceConfig) -> Self {
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let store = Arc::new(SeaOrmStore::new(db.clone()));
        let images = Arc::new(RecordingImages::default());
        let identities = Arc::new(StaticIdentities::default());
        let service = Arc::new(Service::new(
            store.clone(),
            Arc::new(Argon2Hasher::with_params(8, 1, 1).expect("argon2 params")),
            Arc::new(JwtTokenIssuer::new(TEST_SECRET, chrono::Duration::days(30)).expect("jwt")),
            images.clone(),
            identities.clone(),
            config,
        ));

        Self {
            db,
            store,
            service,
            images,
            identities,
        }
    }

    /// Register a user and return (id, bearer token).
    pub async fn user(&self, username: &str) -> (Uuid, String) {
        let session = self
            .service
            .register(username, "pw")
            .await
            .expect("register");
        (session.user.id, session.token)
    }

    pub async fn listing(&self, owner: Uuid, title: &str) -> Uuid {
        self.service
            .create_listing(
                owner,
                NewListing {
                    title: title.to_string(),
                    price: Some(100.0),
                    ..Default::default()
                },
                Vec::new(),
            )
            .await
            .expect("create listing")
            .id
    }

    pub async fn refs(&self, set: RefSet, owner: Uuid) -> Vec<Uuid> {
        let tx: Box<dyn MarketTx> = self.store.begin().await.expect("begin");
        tx.list_refs(set, owner).await.expect("list refs")
    }
}

pub fn upload(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: Bytes::from_static(b"\x89PNG fake"),
    }
}

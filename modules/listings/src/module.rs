use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use url::Url;

use crate::api::rest::routes;
use crate::config::ListingsConfig;
use crate::contract::client::ListingsApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::ListingsLocalClient;
use crate::infra::auth::{Argon2Hasher, GoogleIdentityVerifier, JwtTokenIssuer};
use crate::infra::images::{CloudinaryImageStore, CloudinarySettings};
use crate::infra::storage::{migrations::Migrator, SeaOrmStore};

/// The listings module: wires the production adapters around the domain
/// service and exposes its REST router and in-process client.
pub struct Listings {
    service: Arc<Service>,
}

impl Listings {
    /// Build the module from its config section and an open database connection.
    /// Does not touch the schema; call [`Listings::migrate`] first.
    pub fn init(cfg: &ListingsConfig, db: DatabaseConnection) -> Result<Self> {
        let tokens = JwtTokenIssuer::new(
            &cfg.jwt_secret,
            chrono::Duration::days(cfg.token_ttl_days),
        )
        .context("modules.listings.jwt_secret")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building HTTP client")?;

        let jwks_url = Url::parse(&cfg.google_jwks_url)
            .with_context(|| format!("invalid google_jwks_url '{}'", cfg.google_jwks_url))?;
        if cfg.google_client_id.is_none() {
            warn!("google_client_id not set, Google sign-in is disabled");
        }
        let identity = GoogleIdentityVerifier::new(http.clone(), jwks_url, cfg.google_client_id.clone());

        let api_base = Url::parse(&cfg.cloudinary_api_base)
            .with_context(|| format!("invalid cloudinary_api_base '{}'", cfg.cloudinary_api_base))?;
        if cfg.cloudinary_cloud_name.is_none() || cfg.cloudinary_upload_preset.is_none() {
            warn!("Cloudinary not configured, listings can only use the placeholder image");
        }
        let images = CloudinaryImageStore::new(
            http,
            CloudinarySettings {
                api_base,
                cloud_name: cfg.cloudinary_cloud_name.clone(),
                upload_preset: cfg.cloudinary_upload_preset.clone(),
                folder: cfg.cloudinary_folder.clone(),
            },
        );

        let service = Service::new(
            Arc::new(SeaOrmStore::new(db)),
            Arc::new(Argon2Hasher::default()),
            Arc::new(tokens),
            Arc::new(images),
            Arc::new(identity),
            ServiceConfig {
                placeholder_image: cfg.placeholder_image.clone(),
                max_images_per_listing: cfg.max_images_per_listing,
            },
        );

        info!("Listings module initialized");
        Ok(Self::from_service(Arc::new(service)))
    }

    /// Wrap an already-built service, e.g. one wired with test doubles.
    pub fn from_service(service: Arc<Service>) -> Self {
        Self { service }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
        info!("Running listings database migrations");
        Migrator::up(db, None)
            .await
            .context("listings migrations failed")
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn router(&self) -> Router {
        routes::router(self.service.clone())
    }

    pub fn client(&self) -> Arc<dyn ListingsApi> {
        Arc::new(ListingsLocalClient::new(self.service.clone()))
    }
}

//! HTTP host: owns the axum router, the shared middleware stack and the listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware::{from_fn, map_response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
pub mod error;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
pub use error::AppError;

/// Collects module routers and serves them behind one middleware stack.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
    // Module routes merged so far
    routes: Mutex<Router>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            routes: Mutex::new(Router::new()),
        }
    }

    pub fn config(&self) -> Arc<ApiIngressConfig> {
        self.config.load_full()
    }

    pub fn update_config(&self, config: ApiIngressConfig) {
        self.config.store(Arc::new(config));
    }

    /// Merge a module's router into the host. Paths must not collide.
    pub fn register_routes(&self, module: &str, router: Router) {
        let mut guard = self.routes.lock();
        let current = std::mem::take(&mut *guard);
        *guard = current.merge(router);
        tracing::debug!(module, "registered module routes");
    }

    /// Build the HTTP router from registered routes.
    pub fn build_router(&self) -> Result<Router> {
        let config = self.config();
        let routes = self.routes.lock().clone();
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(routes);

        // Layers are listed innermost first:
        // BodyLimit -> CORS -> Timeout -> layer_errors_as_json -> push_req_id_to_extensions -> Trace -> PropagateRequestId -> SetRequestId
        router = router
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
            .layer(DefaultBodyLimit::max(config.body_limit_bytes));

        if config.cors_enabled {
            router = router.layer(cors_layer(&config)?);
        }

        let x_request_id = request_id::header();
        router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(map_response(error::layer_errors_as_json))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_id::make_http_span)
                    .on_response(request_id::record_response),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind, report the bound address through `ready`, serve until cancelled.
    pub async fn serve(
        self: Arc<Self>,
        cancel: CancellationToken,
        ready: Option<oneshot::Sender<SocketAddr>>,
    ) -> Result<()> {
        let cfg = self.config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", cfg.bind_addr))?;

        let router = self.build_router()?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        let local = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", local);
        if let Some(tx) = ready {
            let _ = tx.send(local);
        }

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}

fn cors_layer(cfg: &ApiIngressConfig) -> Result<CorsLayer> {
    let Some(origin) = cfg.cors_origin.as_deref().filter(|o| !o.trim().is_empty()) else {
        return Ok(CorsLayer::permissive());
    };
    let origin: HeaderValue = origin
        .trim()
        .parse()
        .with_context(|| format!("Invalid CORS origin '{origin}'"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([request_id::header()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cors_origin_fails_router_build() {
        let ingress = ApiIngress::new(ApiIngressConfig {
            cors_origin: Some("bad\norigin".into()),
            ..Default::default()
        });
        assert!(ingress.build_router().is_err());
    }

    #[test]
    fn config_can_be_swapped() {
        let ingress = ApiIngress::default();
        assert!(ingress.config().bind_addr.is_empty());
        ingress.update_config(ApiIngressConfig {
            bind_addr: "127.0.0.1:0".into(),
            ..Default::default()
        });
        assert_eq!(ingress.config().bind_addr, "127.0.0.1:0");
    }
}

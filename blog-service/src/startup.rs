use crate::config::{BlogConfig, StoreBackend};
use crate::handlers;
use crate::services::{CouchDb, InMemoryStore, PostStore};
use axum::{
    middleware::from_fn,
    routing::{any, delete, get, patch, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/getall", get(handlers::list_posts))
        .route("/getby/:id", get(handlers::get_post))
        .route("/post", post(handlers::create_post))
        .route("/update/:id", put(handlers::update_post))
        .route("/patch/:id", patch(handlers::patch_post))
        .route("/delete/:id", delete(handlers::delete_post))
        .route("/all", any(handlers::method_not_allowed))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .fallback(handlers::route_not_found)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Open the configured document store.
pub async fn connect_store(config: &BlogConfig) -> Result<Arc<dyn PostStore>, AppError> {
    match config.store.backend {
        StoreBackend::CouchDb => {
            let db = CouchDb::connect(&config.couchdb).await?;
            if config.couchdb.create_database {
                db.ensure_database().await.map_err(|e| {
                    tracing::error!(
                        "Failed to ensure CouchDB database {} exists: {}",
                        db.database(),
                        e
                    );
                    AppError::DatabaseError(anyhow::Error::new(e))
                })?;
            }
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; posts are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: BlogConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(&config, store).await
    }

    /// Bind the listener and assemble the router around an already-open store.
    pub async fn build_with_store(
        config: &BlogConfig,
        store: Arc<dyn PostStore>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(store);
        let router = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Blog API listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}

// app.rs - shared state, store wiring and the HTTP router

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, CredentialStore, MemoryCredentialStore, PlatformAuthClient};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{self, DatabaseError, MemoryStore, PgStore, ProductStore, ProfileStore};
use crate::handlers::{self, auth, products};
use crate::middleware::{enforce_deadline, preflight, require_user};

/// Handles to the external stores, shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductStore>,
        profiles: Arc<dyn ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            products,
            profiles,
            credentials,
        }
    }

    /// Process-local state: one `MemoryStore` serves products and profiles.
    pub fn memory(store: Arc<MemoryStore>, credentials: Arc<MemoryCredentialStore>) -> Self {
        Self::new(store.clone(), store, credentials)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Database(#[from] DatabaseError),

    #[error("auth platform: {0}")]
    Auth(#[from] AuthError),
}

/// Build the stores selected by `config.backend`.
pub async fn connect(config: &AppConfig) -> Result<AppState, StartupError> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = database::manager::connect(&config.database).await?;
            let store = Arc::new(PgStore::new(pool));
            let credentials = Arc::new(PlatformAuthClient::new(&config.platform)?);
            tracing::info!("Using platform Postgres and auth service");
            Ok(AppState::new(store.clone(), store, credentials))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; data is lost on restart");
            Ok(AppState::memory(
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryCredentialStore::new()),
            ))
        }
    }
}

/// The full application router.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(product_routes(state.clone()));

    let base_path = config.api.normalized_base_path();
    let api = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    let deadline = Duration::from_secs(config.api.request_timeout_secs);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(middleware::from_fn_with_state(deadline, enforce_deadline))
        .layer(middleware::from_fn(preflight))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn auth_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route(
            "/auth/register",
            post(auth::register).fallback(handlers::not_found),
        )
        .route("/auth/login", post(auth::login).fallback(handlers::not_found));

    let protected = Router::new()
        .route("/auth/me", get(auth::me).fallback(handlers::not_found))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    public.merge(protected)
}

// Every product route, including unmatched methods, is authenticated first.
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list)
                .post(products::create)
                .fallback(handlers::not_found),
        )
        .route(
            "/products/:id",
            get(products::read)
                .put(products::update)
                .delete(products::delete)
                .fallback(handlers::not_found),
        )
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
}

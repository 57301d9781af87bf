use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod articles;
pub mod auth;
mod bookmarks;
mod engagement;
mod error;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn articles(&self) -> &Arc<crate::services::ArticleService> {
        &self.shared.articles
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<crate::services::AuthService> {
        &self.shared.auth
    }

    #[must_use]
    pub fn bookmarks(&self) -> &Arc<crate::services::BookmarkService> {
        &self.shared.bookmarks
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/bookmarks", get(bookmarks::list))
        .route("/bookmarks", post(bookmarks::create))
        .route("/bookmarks/count", get(bookmarks::count))
        .route("/bookmarks/{id}", delete(bookmarks::remove))
        .route("/search-history", get(engagement::search_history))
        .route("/preferences", get(engagement::get_preferences))
        .route("/preferences", put(engagement::update_preferences))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Search works anonymously but records history for logged-in users.
    let search_routes = Router::new()
        .route("/articles/search", get(articles::search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth,
        ));

    let api_router = Router::new()
        .merge(protected_routes)
        .merge(search_routes)
        .route("/articles", get(articles::list))
        .route("/articles/sources", get(articles::sources))
        .route("/articles/{id}", get(articles::get_article))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod films;
pub mod images;
pub mod links;
pub mod models;
pub mod reference;
pub mod routes;
pub mod search;
pub mod templates;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use cookie::Key;
use governor::DefaultDirectRateLimiter;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{config::Config, films::FilmStore, images::ImageStore};

pub struct AppState {
    pub config: Arc<Config>,
    pub films: FilmStore,
    pub key: Key,
    pub login_limiter: Arc<DefaultDirectRateLimiter>,
}

pub async fn build_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let config = Arc::new(config);
    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set; the catalogue is read-only");
    }

    let db = db::connect_and_migrate(&config.database_url).await?;
    let images = ImageStore::new(
        config.image_dir.clone(),
        &config.image_base_url,
        &config.placeholder_image_url,
    );
    let films = FilmStore::new(db, images, config.max_results);

    Ok(Arc::new(AppState {
        key: auth::session_key(config.session_secret.as_deref()),
        login_limiter: auth::login_limiter(config.login_attempts_per_minute),
        config,
        films,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let images = ServeDir::new(state.films.images().root());
    let upload_limit = DefaultBodyLimit::max(state.config.upload_max_bytes);

    Router::new()
        .route("/", get(routes::index))
        .route(
            "/films",
            get(routes::search_films).post(routes::create_film).layer(upload_limit.clone()),
        )
        .route("/films/new", get(routes::new_film))
        .route(
            "/films/{id}",
            get(routes::show_film).post(routes::update_film).layer(upload_limit),
        )
        .route("/films/{id}/edit", get(routes::edit_film))
        .route("/films/{id}/delete", post(routes::delete_film))
        .route("/api/films", get(routes::search_films_json))
        .route("/stats", get(routes::stats))
        .route("/login", get(routes::login_form).post(routes::login))
        .route("/logout", post(routes::logout))
        .nest_service("/images", images)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any)),
        )
}

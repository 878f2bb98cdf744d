use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub db: db::DbPool,
    pub engine: Arc<dyn services::engine::MoveSource>,
    /// VAPID public key handed to browsers subscribing to push, if configured.
    pub vapid_public_key: Option<String>,
}

pub fn build_router(state: AppState, static_dir: Option<&str>) -> Router {
    let app = Router::new()
        .nest("/api", routes::api::router().merge(routes::matches::router()))
        .route("/up", get(routes::health::health_check));

    let app = match static_dir {
        Some(dir) => app.fallback_service(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    axum::http::header::CACHE_CONTROL,
                    axum::http::HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(dir)),
        ),
        None => app,
    };

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

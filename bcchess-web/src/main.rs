use std::sync::Arc;

use axum::extract::Request;
use bcchess_web::AppState;
use bcchess_web::config::Config;
use bcchess_web::services::engine::StockfishApi;
use bcchess_web::services::notify_sweep;
use bcchess_web::services::push::WebPushSender;
use tower::Layer as _;
use tower_http::normalize_path::NormalizePathLayer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bcchess_web=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    let pool = bcchess_web::db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to create database pool");

    bcchess_web::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let engine = StockfishApi::new(config.engine_url.clone(), config.engine_timeout)
        .expect("Failed to build engine client");
    tracing::info!("Using engine at {}", config.engine_url);

    match &config.vapid {
        Some(vapid) => match WebPushSender::new(vapid.clone()) {
            Ok(sender) => {
                let sweep_pool = pool.clone();
                let hours = config.notify_hours.clone();
                tracing::info!("Push reminders scheduled at {hours:?} UTC");
                tokio::spawn(async move {
                    notify_sweep::run(sweep_pool, Arc::new(sender), hours).await;
                });
            }
            Err(e) => tracing::error!("Push reminders disabled: {e}"),
        },
        None => tracing::warn!("VAPID keys not set, push reminders disabled"),
    }

    let state = AppState {
        db: pool,
        engine: Arc::new(engine),
        vapid_public_key: config.vapid.as_ref().map(|v| v.public_key.clone()),
    };
    let app = bcchess_web::build_router(state, config.static_dir.as_deref());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting bcchess-web on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let app = NormalizePathLayer::trim_trailing_slash().layer(app);
    axum::serve(
        listener,
        axum::ServiceExt::<Request>::into_make_service(app),
    )
    .await
    .expect("Server error");
}

use std::sync::Arc;

use clubcloud_api::config::AppConfig;
use clubcloud_api::database::Gateway;
use clubcloud_api::routes;
use clubcloud_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up JWT_SECRET, APP_KEY_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = Arc::new(AppConfig::from_env());
    tracing::info!(
        debug = config.debug,
        entry_point = %config.entry_point,
        "starting ClubCloud API"
    );

    let gateway = Arc::new(Gateway::new(config.database.clone()));
    let router = Arc::new(routes::build_router(&config));

    let state = AppState {
        config,
        gateway: gateway.clone(),
        router,
    };

    let app = clubcloud_api::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    gateway.close_all().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

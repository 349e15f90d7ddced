use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod http;
pub mod routes;
pub mod services;
pub mod state;

use error::AppError;
use state::AppState;

/// Build the axum application. Axum is only the transport shell: every
/// request funnels through the fallback into our own router, which performs
/// the pattern matching, the auth gate, and the dispatch.
pub fn app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .fallback(dispatch)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Unreadable request body".to_string())
                .to_response(state.config.debug);
        }
    };

    let router = state.router.clone();
    router
        .dispatch(&state, &parts.method, parts.uri.path(), &parts.headers, &bytes)
        .await
}

/// Liveness probe used by deployments; bypasses the API router. With an
/// `app` query parameter it also pings that tenant's database.
pub async fn health(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    let now = chrono::Utc::now();

    let Some(app) = params.get("app") else {
        return (
            StatusCode::OK,
            axum::Json(json!({ "status": "ok", "timestamp": now })),
        );
    };

    match state.gateway.health_check(app).await {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}

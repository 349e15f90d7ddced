//! End-to-end tests of the router gate: pattern matching, App-Key tenant
//! verification, token authentication, role authorization, and parameter
//! validation. Every path exercised here fails (or succeeds) before a real
//! database connection is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use clubcloud_api::auth;
use clubcloud_api::config::{app_key, roles, AppConfig, DatabaseConfig, SecurityConfig};
use clubcloud_api::database::Gateway;
use clubcloud_api::routes;
use clubcloud_api::state::AppState;

const APP_KEY_SECRET: &str = "0123456789abcdef";
const APP_KEY_IV: &str = "fedcba9876543210";
const TENANT: &str = "club_demo";

fn test_config() -> AppConfig {
    AppConfig {
        debug: false,
        entry_point: "/api".to_string(),
        max_body_bytes: 1024 * 1024,
        security: SecurityConfig {
            jwt_secret: "integration-test-secret".to_string(),
            session_minutes: 60,
            app_key_secret: APP_KEY_SECRET.to_string(),
            app_key_iv: APP_KEY_IV.to_string(),
            authorized_apps: vec![TENANT.to_string()],
            public_routes: vec!["/login".to_string(), "/signup".to_string()],
        },
        database: DatabaseConfig {
            max_connections: 1,
            connect_timeout_secs: 1,
        },
    }
}

fn test_app() -> axum::Router {
    let config = Arc::new(test_config());
    let gateway = Arc::new(Gateway::new(config.database.clone()));
    let router = Arc::new(routes::build_router(&config));
    clubcloud_api::app(AppState {
        config,
        gateway,
        router,
    })
}

fn token_with_roles(roles: &[&str]) -> String {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    auth::issue_token(1, "tester", &roles, TENANT, &test_config().security)
        .expect("token generation")
}

fn app_key_header() -> String {
    app_key::encode_app_name(TENANT, APP_KEY_SECRET, APP_KEY_IV).expect("app key")
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn message(body: &Value) -> &str {
    body.get("message").and_then(Value::as_str).unwrap_or("")
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/nope")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[roles::ADMIN])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Debe iniciar sesión");
}

#[tokio::test]
async fn protected_route_with_garbage_token_is_unauthorized() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Debe iniciar sesión");
}

#[tokio::test]
async fn admin_route_rejects_other_roles() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[roles::TRAINER])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message(&body), "Acceso restringido al recurso");
}

#[tokio::test]
async fn non_numeric_user_id_is_an_argument_mismatch() {
    // The id is parsed before any database work, so this never needs a pool.
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/user/abc")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[roles::ADMIN])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Incorrect argument type");
}

#[tokio::test]
async fn preflight_answers_ok_without_credentials() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/user")
        .body(Body::empty())
        .unwrap();

    let response = test_app().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/api/user")
        .body(Body::empty())
        .unwrap();

    let response = test_app().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn login_without_app_key_is_unauthorized() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "user": "alice", "password": "pw" }).to_string(),
        ))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Acceso restringido al recurso");
}

#[tokio::test]
async fn login_with_forged_app_key_is_unauthorized() {
    let forged = app_key::encode_app_name(TENANT, "another-secret16", APP_KEY_IV)
        .expect("forged key");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header("App-Key", forged)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Acceso restringido al recurso");
}

#[tokio::test]
async fn login_with_app_key_but_no_credentials_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header("App-Key", app_key_header())
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "El usuario y la contraseña no deben ser nulos");
}

#[tokio::test]
async fn signup_with_mismatched_passwords_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/signup")
        .header("App-Key", app_key_header())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "user": "alice",
                "password": "one",
                "confirm_password": "two"
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Las contraseñas no coinciden");
}

#[tokio::test]
async fn signup_with_empty_credentials_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/signup")
        .header("App-Key", app_key_header())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "user": "",
                "password": "",
                "confirm_password": ""
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "El usuario y la contraseña no deben estar vacíos");
}

#[tokio::test]
async fn cookie_token_grants_access() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/logo")
        .header(
            header::COOKIE,
            format!("AuthToken={}", token_with_roles(&[])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "url": "images/logo.jpg" }));
}

#[tokio::test]
async fn verify_session_reports_true_for_valid_token() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/verifySession")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[roles::FAMILY])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));
}

#[tokio::test]
async fn logout_expires_session_cookies() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/logout")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[])),
        )
        .body(Body::empty())
        .unwrap();

    let response = test_app().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("AuthToken=;")));
    assert!(cookies.iter().any(|c| c.starts_with("SessionID=;")));
    assert!(cookies.iter().all(|c| c.contains("Expires=Thu, 01 Jan 1970")));
}

#[tokio::test]
async fn trailing_slash_matches_the_route() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/logo/")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_with_roles(&[])),
        )
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_probe_bypasses_the_gate() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("status").and_then(Value::as_str), Some("ok"));
}

#[tokio::test]
async fn health_probe_reports_unconfigured_tenant_database() {
    // No CLUB_UNCONFIGURED_DATABASE_URL in the environment, so the tenant
    // ping degrades before any connection is attempted.
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health?app=club_unconfigured")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.get("status").and_then(Value::as_str), Some("degraded"));
    assert!(body
        .get("database_error")
        .and_then(Value::as_str)
        .unwrap_or("")
        .contains("CLUB_UNCONFIGURED_DATABASE_URL"));
}

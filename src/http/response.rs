use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

/// Serialize a JSON body with the given status.
pub fn json(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// The `{"message": ...}` shape used across the API.
pub fn message(status: StatusCode, text: &str) -> Response {
    json(status, json!({ "message": text }))
}

/// Append expired `Set-Cookie` headers so the client drops its session
/// cookies. Logout is purely client-side; there is no server-side token
/// revocation.
pub fn with_expired_cookies(mut response: Response, names: &[&str]) -> Response {
    for name in names {
        let cookie = format!(
            "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly",
            name
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

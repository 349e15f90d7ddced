use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::http::response;
use crate::http::router::{PathParams, RequestContext};

/// GET /logo - Static pointer to the tenant logo asset.
pub async fn logo(
    _ctx: RequestContext,
    _params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    Ok(response::json(
        StatusCode::OK,
        json!({ "url": "images/logo.jpg" }),
    ))
}

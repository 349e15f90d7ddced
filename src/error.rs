// HTTP API error taxonomy.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::database::gateway::DbError;

/// API error with the status code carrying the classification. Every error
/// serializes to the `{"message": "..."}` shape.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request
    Validation(String),
    DuplicatedValue(String),
    ArgumentMismatch(String),

    // 401 Unauthorized
    Authentication(String),

    // 403 Forbidden
    Authorization(String),

    // 404 Not Found
    IndexNotFound(String),
    RouteNotFound,

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 500 Internal Server Error
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicatedValue(_) => StatusCode::BAD_REQUEST,
            AppError::ArgumentMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::IndexNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Underlying details are only surfaced when the
    /// debug flag is set; otherwise the generic localized message wins.
    pub fn message(&self, debug: bool) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicatedValue(detail) => {
                if debug {
                    detail.clone()
                } else {
                    "El valor ingresado ya existe".to_string()
                }
            }
            AppError::ArgumentMismatch(detail) => {
                if debug {
                    detail.clone()
                } else {
                    "Incorrect argument type".to_string()
                }
            }
            AppError::Authentication(msg) => msg.clone(),
            AppError::Authorization(msg) => msg.clone(),
            AppError::IndexNotFound(msg) => msg.clone(),
            AppError::RouteNotFound => "Route not found".to_string(),
            AppError::MethodNotAllowed(method) => {
                format!("The method <{}> is not allowed", method)
            }
            AppError::Internal(detail) => {
                if debug {
                    detail.clone()
                } else {
                    "An error occurred while processing your request".to_string()
                }
            }
        }
    }

    pub fn to_response(&self, debug: bool) -> Response {
        if let AppError::Internal(detail) = self {
            tracing::error!("internal error: {}", detail);
        }
        (
            self.status_code(),
            Json(json!({ "message": self.message(debug) })),
        )
            .into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(detail) => AppError::DuplicatedValue(detail),
            DbError::NotFound => AppError::IndexNotFound("Record not found".to_string()),
            DbError::MissingId => {
                AppError::Internal("entity submitted for update without an id".to_string())
            }
            DbError::ConfigMissing(key) => {
                AppError::Internal(format!("missing configuration: {}", key))
            }
            DbError::InvalidAppName(app) => {
                AppError::Internal(format!("invalid tenant application name: {}", app))
            }
            DbError::Sqlx(e) => AppError::Internal(format!("database error: {}", e)),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message(true))
    }
}

impl std::error::Error for AppError {}

//! Authentication endpoints: login, signup, logout, session check.

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{json, Value};

use crate::auth;
use crate::database::models::User;
use crate::error::AppError;
use crate::http::response;
use crate::http::router::{PathParams, RequestContext};
use crate::services::UserService;

const NULL_CREDENTIALS: &str = "El usuario y la contraseña no deben ser nulos";
const EMPTY_CREDENTIALS: &str = "El usuario y la contraseña no deben estar vacíos";
const PASSWORD_MISMATCH: &str = "Las contraseñas no coinciden";
const BAD_CREDENTIALS: &str = "Usuario o contraseña incorrectos";
const DUPLICATED_USERNAME: &str = "El nombre de usuario ingresado ya existe";

/// POST /login - Validate credentials and issue a session token.
pub async fn login(
    ctx: RequestContext,
    _params: PathParams,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let Some(body) = body else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_CREDENTIALS));
    };
    let (Some(username), Some(pass)) = (
        body.get("user").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
    ) else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_CREDENTIALS));
    };

    let username = username.trim().to_lowercase();
    let service = UserService::new(ctx.pool().await?);

    if !service.check_credentials(&username, pass).await? {
        return Ok(response::message(StatusCode::BAD_REQUEST, BAD_CREDENTIALS));
    }

    let user = service.get_user_by_username(&username).await?;
    let roles: Vec<String> = user.roles.iter().map(|r| r.description.clone()).collect();
    let token = auth::issue_token(
        user.id.unwrap_or_default(),
        &user.user,
        &roles,
        &ctx.app,
        &ctx.config.security,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response::json(
        StatusCode::OK,
        json!({ "token": token, "message": "Logged in successfully" }),
    ))
}

/// POST /signup - Register a new user. The username is lower-cased and the
/// stored password hashed; the response carries the redacted entity.
pub async fn signup(
    ctx: RequestContext,
    _params: PathParams,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let Some(body) = body else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_CREDENTIALS));
    };
    let (Some(username), Some(pass), Some(confirm)) = (
        body.get("user").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
        body.get("confirm_password").and_then(Value::as_str),
    ) else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_CREDENTIALS));
    };

    if username.is_empty() || pass.is_empty() {
        return Ok(response::message(StatusCode::BAD_REQUEST, EMPTY_CREDENTIALS));
    }
    if pass != confirm {
        return Ok(response::message(StatusCode::BAD_REQUEST, PASSWORD_MISMATCH));
    }

    let user = User {
        id: None,
        user: username.trim().to_lowercase(),
        password: pass.to_string(),
        roles: vec![],
    };

    let service = UserService::new(ctx.pool().await?);
    match service.create_user(user).await {
        Ok(created) => Ok(response::json(StatusCode::CREATED, json!(created))),
        Err(AppError::DuplicatedValue(detail)) => {
            let message = if ctx.config.debug {
                detail
            } else {
                DUPLICATED_USERNAME.to_string()
            };
            Ok(response::message(StatusCode::BAD_REQUEST, &message))
        }
        Err(e) => Err(e),
    }
}

/// GET /logout - Expire the client's session cookies. Tokens stay valid
/// until expiry; there is no server-side revocation list.
pub async fn logout(
    _ctx: RequestContext,
    _params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    let response = response::message(StatusCode::OK, "Logged out successfully");
    Ok(response::with_expired_cookies(
        response,
        &["AuthToken", "SessionID"],
    ))
}

/// GET /verifySession - Report whether the request carries a valid session.
pub async fn verify_session(
    ctx: RequestContext,
    _params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    Ok(response::json(StatusCode::OK, json!(ctx.session.is_some())))
}

//! User management endpoints, all restricted to administrators.

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{json, Value};

use crate::database::models::{Role, User, REDACTED_PASSWORD};
use crate::error::AppError;
use crate::http::response;
use crate::http::router::{PathParams, RequestContext};
use crate::services::UserService;

const NULL_UPDATE_FIELDS: &str = "El usuario, la contraseña y los roles no deben ser nulos";
const EMPTY_CREDENTIALS: &str = "El usuario y la contraseña no deben estar vacíos";
const PASSWORD_MISMATCH: &str = "Las contraseñas no coinciden";
const DUPLICATED_USERNAME: &str = "El nombre de usuario ingresado ya existe";
const USER_NOT_FOUND: &str = "No se encontró un usuario con el id ingresado";
const UPDATE_USER_NOT_FOUND: &str = "No existe un usuario con el id ingresado";
const ROLE_NOT_FOUND: &str = "No existe un rol con el id ingresado";
const DELETE_USER_NOT_FOUND: &str = "El id ingresado no corresponde a ningún usuario";

/// GET /user - Every user with roles attached, passwords redacted.
pub async fn all_users(
    ctx: RequestContext,
    _params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    let service = UserService::new(ctx.pool().await?);
    let users = service.get_all_users().await?;
    Ok(response::json(StatusCode::OK, json!(users)))
}

/// GET /user/{idUser}
pub async fn user_by_id(
    ctx: RequestContext,
    params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    let id = params.require_i64(0)?;
    let service = UserService::new(ctx.pool().await?);
    let mut user = match service.get_user_by_id(id).await {
        Ok(user) => user,
        Err(AppError::IndexNotFound(_)) => {
            return Ok(response::message(StatusCode::NOT_FOUND, USER_NOT_FOUND));
        }
        Err(e) => return Err(e),
    };

    user.password = REDACTED_PASSWORD.to_string();
    Ok(response::json(StatusCode::OK, json!(user)))
}

/// GET /user/username/{username}
pub async fn user_by_username(
    ctx: RequestContext,
    params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    let username = params.get(0)?;
    let service = UserService::new(ctx.pool().await?);
    let mut user = match service.get_user_by_username(username).await {
        Ok(user) => user,
        Err(AppError::IndexNotFound(_)) => {
            return Ok(response::message(StatusCode::NOT_FOUND, USER_NOT_FOUND));
        }
        Err(e) => return Err(e),
    };

    user.password = REDACTED_PASSWORD.to_string();
    Ok(response::json(StatusCode::OK, json!(user)))
}

/// PUT /user/{idUser} - Update the user row and replace its role set.
pub async fn update_user(
    ctx: RequestContext,
    params: PathParams,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let id = params.require_i64(0)?;

    let Some(body) = body else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_UPDATE_FIELDS));
    };
    let (Some(username), Some(pass), Some(confirm), Some(role_ids)) = (
        body.get("user").and_then(Value::as_str),
        body.get("password").and_then(Value::as_str),
        body.get("confirm_password").and_then(Value::as_str),
        body.get("roles").and_then(Value::as_array),
    ) else {
        return Ok(response::message(StatusCode::BAD_REQUEST, NULL_UPDATE_FIELDS));
    };

    if username.is_empty() || pass.is_empty() {
        return Ok(response::message(StatusCode::BAD_REQUEST, EMPTY_CREDENTIALS));
    }
    if pass != confirm {
        return Ok(response::message(StatusCode::BAD_REQUEST, PASSWORD_MISMATCH));
    }

    let service = UserService::new(ctx.pool().await?);

    if let Err(AppError::IndexNotFound(_)) = service.get_user_by_id(id).await {
        return Ok(response::message(
            StatusCode::NOT_FOUND,
            UPDATE_USER_NOT_FOUND,
        ));
    }

    let mut roles: Vec<Role> = Vec::with_capacity(role_ids.len());
    for role_id in role_ids {
        let Some(role_id) = role_id.as_i64() else {
            return Ok(response::message(StatusCode::NOT_FOUND, ROLE_NOT_FOUND));
        };
        match service.get_role_by_id(role_id).await {
            Ok(role) => roles.push(role),
            Err(AppError::IndexNotFound(_)) => {
                return Ok(response::message(StatusCode::NOT_FOUND, ROLE_NOT_FOUND));
            }
            Err(e) => return Err(e),
        }
    }

    let user = User {
        id: Some(id),
        user: username.trim().to_lowercase(),
        password: pass.to_string(),
        roles,
    };

    match service.update_user(user).await {
        Ok(updated) => Ok(response::json(StatusCode::OK, json!(updated))),
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

/// DELETE /user/{idUser}
pub async fn delete_user(
    ctx: RequestContext,
    params: PathParams,
    _body: Option<Value>,
) -> Result<Response, AppError> {
    let id = params.require_i64(0)?;
    let service = UserService::new(ctx.pool().await?);

    let deleted = match service.delete_user_by_id(id).await {
        Ok(count) => count,
        Err(AppError::IndexNotFound(_)) => {
            return Ok(response::message(
                StatusCode::NOT_FOUND,
                DELETE_USER_NOT_FOUND,
            ));
        }
        Err(e) => return Err(e),
    };

    Ok(response::message(
        StatusCode::OK,
        &format!("Se han eliminado ({}) usuarios", deleted),
    ))
}

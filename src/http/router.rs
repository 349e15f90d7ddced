//! Request router and auth gate.
//!
//! Routes are registered as method + URI template + action + required roles.
//! Templates use `{name}` placeholders for path parameters. Matching is
//! linear within the method's bucket, in registration order; the first
//! pattern that matches wins, so registration order is significant.
//!
//! Per request the router walks `match -> gate -> dispatch`: public routes
//! get a tenant-only App-Key check, every other route requires a valid
//! bearer token (header or `AuthToken` cookie) plus, when the route declares
//! roles, a non-empty intersection with the session's roles.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use regex::Regex;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::{self, Session};
use crate::config::{app_key, AppConfig};
use crate::database::gateway::{DbError, Gateway};
use crate::error::AppError;
use crate::http::response;
use crate::state::AppState;

/// Everything an action needs from the request pipeline: configuration, the
/// shared gateway, and the request-scoped session/tenant identity.
pub struct RequestContext {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<Gateway>,
    /// `None` on public routes; always present behind the user gate.
    pub session: Option<Session>,
    /// Tenant application, from the session claims or the App-Key header.
    pub app: String,
}

impl RequestContext {
    /// Database pool for the request's tenant.
    pub async fn pool(&self) -> Result<PgPool, DbError> {
        self.gateway.pool(&self.app).await
    }
}

/// Ordered positional path parameters captured from the URI. Values are
/// always strings; actions do their own parsing, and a parse failure is an
/// argument mismatch, not a router error.
pub struct PathParams(Vec<String>);

impl PathParams {
    pub fn get(&self, index: usize) -> Result<&str, AppError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| AppError::ArgumentMismatch("Too few arguments".to_string()))
    }

    pub fn require_i64(&self, index: usize) -> Result<i64, AppError> {
        let raw = self.get(index)?;
        raw.parse().map_err(|_| {
            AppError::ArgumentMismatch(format!(
                "expected integer path parameter at position {}, got '{}'",
                index, raw
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type ActionFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// A bound controller action: path parameters first, then the parsed JSON
/// body when the request carried one.
pub type Action =
    Arc<dyn Fn(RequestContext, PathParams, Option<Value>) -> ActionFuture + Send + Sync>;

/// Wrap a plain async fn into an [`Action`].
pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(RequestContext, PathParams, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    Arc::new(move |ctx, params, body| Box::pin(f(ctx, params, body)))
}

struct Route {
    template: String,
    pattern: Regex,
    action: Action,
    roles: Vec<String>,
}

pub struct Router {
    entry_point: String,
    methods: HashMap<Method, Vec<Route>>,
}

const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

impl Router {
    /// `entry_point` is the path prefix stripped before matching (e.g.
    /// `/api`); pass an empty string for none.
    pub fn new(entry_point: impl Into<String>) -> Self {
        let methods = SUPPORTED_METHODS
            .into_iter()
            .map(|m| (m, Vec::new()))
            .collect();
        Self {
            entry_point: entry_point.into(),
            methods,
        }
    }

    pub fn get(&mut self, uri: &str, action: Action, roles: &[&str]) {
        self.register(Method::GET, uri, action, roles);
    }

    pub fn post(&mut self, uri: &str, action: Action, roles: &[&str]) {
        self.register(Method::POST, uri, action, roles);
    }

    pub fn put(&mut self, uri: &str, action: Action, roles: &[&str]) {
        self.register(Method::PUT, uri, action, roles);
    }

    pub fn delete(&mut self, uri: &str, action: Action, roles: &[&str]) {
        self.register(Method::DELETE, uri, action, roles);
    }

    pub fn patch(&mut self, uri: &str, action: Action, roles: &[&str]) {
        self.register(Method::PATCH, uri, action, roles);
    }

    fn register(&mut self, method: Method, uri: &str, action: Action, roles: &[&str]) {
        let template = normalize_template(uri);
        let pattern = compile_template(&template);
        let route = Route {
            template,
            pattern,
            action,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };
        self.methods
            .get_mut(&method)
            .expect("route buckets exist for all supported methods")
            .push(route);
    }

    /// Handle one request end to end and always produce a response; errors
    /// at any gate are serialized here using the configured debug flag.
    pub async fn dispatch(
        &self,
        state: &AppState,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        match self.try_dispatch(state, method, path, headers, body).await {
            Ok(response) => response,
            Err(err) => err.to_response(state.config.debug),
        }
    }

    async fn try_dispatch(
        &self,
        state: &AppState,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response, AppError> {
        let Some(routes) = self.methods.get(method) else {
            // Pre-flight requests answer trivially without running the gate.
            if method == Method::OPTIONS {
                return Ok(response::json(StatusCode::OK, json!([])));
            }
            return Err(AppError::MethodNotAllowed(method.to_string()));
        };

        let path = self.strip_entry_point(path);

        for route in routes {
            let Some(captures) = route.pattern.captures(&path) else {
                continue;
            };
            let params: Vec<String> = captures
                .iter()
                .skip(1) // drop the full-match capture
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect();

            let ctx = self.authorize(state, route, headers)?;

            // A body that fails to parse as JSON is treated as absent.
            let body_json = if body.is_empty() {
                None
            } else {
                serde_json::from_slice(body).ok()
            };

            return (route.action)(ctx, PathParams(params), body_json).await;
        }

        Err(AppError::RouteNotFound)
    }

    /// The auth gate: tenant-only check for public routes, token + role
    /// check for everything else.
    fn authorize(
        &self,
        state: &AppState,
        route: &Route,
        headers: &HeaderMap,
    ) -> Result<RequestContext, AppError> {
        let security = &state.config.security;

        if security.public_routes.contains(&route.template) {
            let app = verify_app(headers, state.config.as_ref())?;
            return Ok(RequestContext {
                config: state.config.clone(),
                gateway: state.gateway.clone(),
                session: None,
                app,
            });
        }

        let token = bearer_or_cookie_token(headers)
            .ok_or_else(|| AppError::Authentication("Debe iniciar sesión".to_string()))?;
        let session = auth::validate_token(&token, security)
            .ok_or_else(|| AppError::Authentication("Debe iniciar sesión".to_string()))?;

        if !route.roles.is_empty() {
            let granted = route.roles.iter().any(|r| session.roles.contains(r));
            if !granted {
                tracing::warn!(
                    user = %session.username,
                    template = %route.template,
                    "role check failed"
                );
                return Err(AppError::Authorization(
                    "Acceso restringido al recurso".to_string(),
                ));
            }
        }

        let app = session.app.clone();
        Ok(RequestContext {
            config: state.config.clone(),
            gateway: state.gateway.clone(),
            session: Some(session),
            app,
        })
    }

    fn strip_entry_point(&self, path: &str) -> String {
        let stripped = if self.entry_point.is_empty() {
            path.to_string()
        } else {
            path.replacen(&self.entry_point, "", 1)
        };
        if stripped.is_empty() {
            "/".to_string()
        } else {
            stripped
        }
    }

    #[cfg(test)]
    fn match_route(&self, method: &Method, path: &str) -> Option<(&str, Vec<String>)> {
        let routes = self.methods.get(method)?;
        let path = self.strip_entry_point(path);
        for route in routes {
            if let Some(captures) = route.pattern.captures(&path) {
                let params = captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().to_string())
                    .collect();
                return Some((route.template.as_str(), params));
            }
        }
        None
    }
}

fn normalize_template(uri: &str) -> String {
    format!("/{}", uri.trim_matches('/'))
}

/// `{name}` segments become `(\w+)` capture groups; the whole path is
/// anchored and a trailing slash is tolerated.
fn compile_template(template: &str) -> Regex {
    let placeholder = Regex::new(r"\{\w+}").expect("placeholder pattern is valid");
    let expr = placeholder.replace_all(template, r"(\w+)");
    Regex::new(&format!("^{}/?$", expr)).expect("compiled route pattern is valid")
}

/// Token from `Authorization: Bearer ...`, falling back to the `AuthToken`
/// cookie.
fn bearer_or_cookie_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("authorization") {
        let value = value.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        return Some(token.to_string());
    }

    let cookies = headers.get("cookie")?.to_str().ok()?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some("AuthToken") {
            let token = parts.next()?.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Validate the App-Key header: decrypt the tenant name and confirm it is an
/// authorized application.
fn verify_app(headers: &HeaderMap, config: &AppConfig) -> Result<String, AppError> {
    let denied = || AppError::Authentication("Acceso restringido al recurso".to_string());

    let header = headers
        .get("App-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(denied)?;

    let security = &config.security;
    let app = app_key::decode_app_name(header, &security.app_key_secret, &security.app_key_iv)
        .map_err(|e| {
            tracing::warn!("App-Key rejected: {}", e);
            denied()
        })?;

    if !security.authorized_apps.contains(&app) {
        return Err(denied());
    }
    Ok(app)
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

/// Claims embedded in every session token (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    /// Role descriptions granted to the user.
    pub roles: Vec<String>,
    /// Tenant application the session belongs to.
    pub app: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity of the authenticated caller for the duration of one request.
/// Rebuilt from the token on every request and threaded through the request
/// context; never stored process-wide.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub app: String,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            roles: claims.roles,
            app: claims.app,
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    InvalidSecret,
    Generation(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::InvalidSecret => write!(f, "JWT secret is not configured"),
            TokenError::Generation(msg) => write!(f, "JWT generation error: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issue a signed, time-limited session token. Expiry is `now` plus the
/// configured session length in minutes.
pub fn issue_token(
    user_id: i64,
    username: &str,
    roles: &[String],
    app: &str,
    security: &SecurityConfig,
) -> Result<String, TokenError> {
    if security.jwt_secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        roles: roles.to_vec(),
        app: app.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(security.session_minutes)).timestamp(),
    };

    let key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Verify signature and expiry. Any failure (bad signature, expired,
/// malformed) is `None`; the caller treats that as unauthenticated, not as
/// an exceptional condition.
pub fn validate_token(token: &str, security: &SecurityConfig) -> Option<Session> {
    if security.jwt_secret.is_empty() {
        return None;
    }

    let key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens are valid until exactly their expiry instant.
    validation.leeway = 0;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Some(Session::from(data.claims)),
        Err(_) => None,
    }
}

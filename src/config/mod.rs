use std::env;

pub mod app_key;

/// Role catalog shared with the client applications. Route guards and token
/// claims carry the descriptions, not the keys.
pub mod roles {
    pub const ADMIN: &str = "Administrador";
    pub const TRAINER: &str = "Formador";
    pub const FAMILY: &str = "Familiar";
    pub const COORDINATOR: &str = "Coordinador";
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// When set, error responses surface the underlying messages verbatim
    /// instead of the generic localized ones.
    pub debug: bool,
    /// Path prefix stripped before route matching, e.g. "/api".
    pub entry_point: String,
    pub max_body_bytes: usize,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub session_minutes: i64,
    /// 16-byte key for the App-Key tenant header (AES-128-CTR).
    pub app_key_secret: String,
    /// 16-byte IV for the App-Key tenant header.
    pub app_key_iv: String,
    /// Tenant applications allowed to call the public endpoints.
    pub authorized_apps: Vec<String>,
    /// URI templates reachable without a user token. These still require a
    /// valid App-Key header.
    pub public_routes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            debug: false,
            entry_point: "/api".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_minutes: 60,
                app_key_secret: String::new(),
                app_key_iv: String::new(),
                authorized_apps: vec![],
                public_routes: vec!["/login".to_string(), "/signup".to_string()],
            },
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("APP_DEBUG") {
            self.debug = v.parse().unwrap_or(self.debug);
        }
        if let Ok(v) = env::var("API_ENTRY_POINT") {
            self.entry_point = v;
        }
        if let Ok(v) = env::var("MAX_REQUEST_SIZE_BYTES") {
            self.max_body_bytes = v.parse().unwrap_or(self.max_body_bytes);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_MINUTES") {
            self.security.session_minutes = v.parse().unwrap_or(self.security.session_minutes);
        }
        if let Ok(v) = env::var("APP_KEY_SECRET") {
            self.security.app_key_secret = v;
        }
        if let Ok(v) = env::var("APP_KEY_IV") {
            self.security.app_key_iv = v;
        }
        if let Ok(v) = env::var("AUTHORIZED_APPS") {
            self.security.authorized_apps = split_list(&v);
        }
        if let Ok(v) = env::var("PUBLIC_ROUTES") {
            self.security.public_routes = split_list(&v);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        self
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::defaults();
        assert!(!config.debug);
        assert_eq!(config.entry_point, "/api");
        assert_eq!(config.security.session_minutes, 60);
        assert_eq!(
            config.security.public_routes,
            vec!["/login".to_string(), "/signup".to_string()]
        );
        assert!(config.database.max_connections >= 1);
    }

    #[test]
    fn splits_comma_lists() {
        assert_eq!(
            split_list("club_a, club_b ,,club_c"),
            vec!["club_a", "club_b", "club_c"]
        );
        assert!(split_list("").is_empty());
    }
}

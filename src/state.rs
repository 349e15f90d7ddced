use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::gateway::Gateway;
use crate::http::router::Router;

/// Composition root: the long-lived components shared by every request.
/// Everything request-scoped (session, tenant pool handle) lives in the
/// per-request context instead.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<Gateway>,
    pub router: Arc<Router>,
}

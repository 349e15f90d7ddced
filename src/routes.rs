use crate::config::{roles, AppConfig};
use crate::handlers::{auth, misc, user};
use crate::http::router::{action, Router};

/// Register every endpoint. Registration order matters: the first pattern
/// that matches a request wins.
pub fn build_router(config: &AppConfig) -> Router {
    let mut router = Router::new(config.entry_point.clone());

    // App
    router.get("/logo", action(misc::logo), &[]);

    // Authentication
    router.post("/login", action(auth::login), &[]);
    router.post("/signup", action(auth::signup), &[]);
    router.get("/logout", action(auth::logout), &[]);
    router.get("/verifySession", action(auth::verify_session), &[]);

    // Users
    router.get("/user", action(user::all_users), &[roles::ADMIN]);
    router.get("/user/{idUser}", action(user::user_by_id), &[roles::ADMIN]);
    router.get(
        "/user/username/{username}",
        action(user::user_by_username),
        &[roles::ADMIN],
    );
    router.put("/user/{idUser}", action(user::update_user), &[roles::ADMIN]);
    router.delete("/user/{idUser}", action(user::delete_user), &[roles::ADMIN]);

    router
}

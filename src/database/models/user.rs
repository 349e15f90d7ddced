use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::database::models::Role;
use crate::database::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    /// Username; stored lower-cased and unique.
    pub user: String,
    pub password: String,
    /// Has-many relation resolved through the `user_role` join table,
    /// never stored in the `users` table itself.
    #[sqlx(skip)]
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Entity for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn insert_columns() -> &'static [&'static str] {
        &["user", "password"]
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![json!(self.user), json!(self.password)]
    }
}

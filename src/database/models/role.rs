use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::database::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    #[serde(default)]
    pub id: Option<i64>,
    pub description: String,
}

impl Entity for Role {
    const TABLE: &'static str = "roles";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn insert_columns() -> &'static [&'static str] {
        &["description"]
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![json!(self.description)]
    }
}

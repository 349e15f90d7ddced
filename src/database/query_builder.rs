use std::marker::PhantomData;

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool};

use crate::database::gateway::DbError;
use crate::database::repository::Entity;

/// Builds `SELECT` statements from structured column/value intents.
///
/// Predicates are always parameter-bound with `$n` placeholders; values never
/// end up interpolated into the SQL text. Execution preserves the zero/one/many
/// distinction through the two accessors: `fetch_all` for lists and
/// `fetch_optional` for at-most-one lookups.
pub struct QueryBuilder<T> {
    table: String,
    select_columns: Vec<String>,
    joins: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Value>,
    _phantom: PhantomData<T>,
}

impl<T: Entity> QueryBuilder<T> {
    pub fn new() -> Self {
        Self {
            table: T::TABLE.to_string(),
            select_columns: vec![],
            joins: vec![],
            conditions: vec![],
            params: vec![],
            _phantom: PhantomData,
        }
    }

    /// Project only the given columns. Defaults to `*` when never called.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select_columns = columns.iter().map(|c| quote_path(c)).collect();
        self
    }

    /// Append an inner join: `JOIN table1 ON table1.col1 = table2.col2`.
    pub fn join(mut self, table1: &str, table2: &str, col1: &str, col2: &str) -> Self {
        self.joins.push(format!(
            "JOIN {} ON {}.{} = {}.{}",
            quote(table1),
            quote(table1),
            quote(col1),
            quote(table2),
            quote(col2)
        ));
        self
    }

    /// Add an equality predicate, ANDed with any previous ones.
    pub fn where_eq(mut self, column: &str, value: Value) -> Self {
        self.params.push(value);
        self.conditions
            .push(format!("{} = ${}", quote_path(column), self.params.len()));
        self
    }

    pub fn to_sql(&self) -> String {
        let projection = if self.select_columns.is_empty() {
            "*".to_string()
        } else {
            self.select_columns.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", projection, quote(&self.table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql
    }

    pub async fn fetch_all(self, pool: &PgPool) -> Result<Vec<T>, DbError> {
        let sql = self.to_sql();
        let mut query = sqlx::query_as::<_, T>(&sql);
        for param in &self.params {
            query = bind_value_as(query, param);
        }
        query.fetch_all(pool).await.map_err(DbError::classify)
    }

    pub async fn fetch_optional(self, pool: &PgPool) -> Result<Option<T>, DbError> {
        let sql = self.to_sql();
        let mut query = sqlx::query_as::<_, T>(&sql);
        for param in &self.params {
            query = bind_value_as(query, param);
        }
        query.fetch_optional(pool).await.map_err(DbError::classify)
    }
}

impl<T: Entity> Default for QueryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote a bare SQL identifier.
pub(crate) fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly table-qualified column path (`a.b` becomes `"a"."b"`).
pub(crate) fn quote_path(path: &str) -> String {
    if path == "*" {
        return path.to_string();
    }
    path.split('.').map(quote).collect::<Vec<_>>().join(".")
}

/// Bind a JSON value as a typed positional parameter.
pub(crate) fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        Value::Null => {
            let none: Option<String> = None;
            query.bind(none)
        }
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.clone()),
    }
}

pub(crate) fn bind_value_as<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    value: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match value {
        Value::Null => {
            let none: Option<String> = None;
            query.bind(none)
        }
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.clone()),
    }
}

pub mod gateway;
pub mod models;
pub mod query_builder;
pub mod repository;

pub use gateway::{DbError, Gateway};

use std::sync::Arc;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

mod postgres;
mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Task record. `user_id` is the owner and every query filters on it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Partial update for a task. `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
}

/// Relational store behind the handlers. Two implementations: embedded
/// SQLite and networked Postgres, picked from the DATABASE_URL scheme.
///
/// Task methods take the caller's user id and filter on ownership in SQL, so
/// a task owned by someone else comes back as `None`/`false`, same as a task
/// that does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn create_task(
        &self,
        user_id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, StoreError>;
    async fn get_task(&self, user_id: i64, task_id: i64) -> Result<Option<Task>, StoreError>;
    async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError>;
    async fn update_task(
        &self,
        user_id: i64,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError>;
    async fn delete_task(&self, user_id: i64, task_id: i64) -> Result<bool, StoreError>;
    async fn list_all_tasks(&self) -> Result<Vec<Task>, StoreError>;
}

/// Connect to the store named by `database_url` and bootstrap its schema.
pub async fn connect(database_url: &str) -> anyhow::Result<Arc<dyn Store>> {
    if database_url.starts_with("sqlite:") {
        Ok(Arc::new(SqliteStore::connect(database_url).await?))
    } else if database_url.starts_with("postgres:") || database_url.starts_with("postgresql:") {
        Ok(Arc::new(PgStore::connect(database_url).await?))
    } else {
        anyhow::bail!("unsupported DATABASE_URL scheme: {database_url}")
    }
}

/// Maps a unique-constraint violation on users.email to `DuplicateEmail`.
pub(crate) fn map_user_insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}

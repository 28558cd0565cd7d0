//! Out-of-band admin surface, gated by a single shared secret in the
//! `x-admin-key` header. Independent of user sessions: all-or-nothing,
//! no per-admin identity.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use ring::constant_time::verify_slices_are_equal;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::{
    auth::UserOut,
    error::ApiError,
    state::AppState,
    store::Task,
};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/tasks", get(list_tasks))
}

/// Proof that the request carried the configured admin key.
///
/// With no ADMIN_KEY configured the whole surface is disabled and its routes
/// answer 404, same as if they did not exist.
#[derive(Debug)]
pub struct AdminKey;

#[async_trait]
impl FromRequestParts<AppState> for AdminKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_key.as_deref() else {
            return Err(ApiError::NotFound("resource"));
        };

        let presented = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::AuthRequired)?;

        if verify_slices_are_equal(presented.as_bytes(), expected.as_bytes()).is_err() {
            warn!("admin request with wrong key");
            return Err(ApiError::AuthRequired);
        }

        Ok(AdminKey)
    }
}

#[derive(Debug, Serialize)]
pub struct AdminTaskOut {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Task> for AdminTaskOut {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            done: task.done,
            created_at: task.created_at,
        }
    }
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

#[instrument(skip(state, _admin))]
pub async fn list_tasks(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Result<Json<Vec<AdminTaskOut>>, ApiError> {
    let tasks = state.store.list_all_tasks().await?;
    Ok(Json(tasks.into_iter().map(AdminTaskOut::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::Arc;

    use crate::config::AppConfig;

    async fn state_with_admin_key(key: Option<&str>) -> AppState {
        let config = AppConfig {
            admin_key: key.map(str::to_string),
            ..AppConfig::for_tests()
        };
        AppState::for_tests_with_config(Arc::new(config)).await
    }

    fn parts_with_header(key: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/users");
        if let Some(key) = key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn fails_closed_when_unconfigured() {
        let state = state_with_admin_key(None).await;
        let mut parts = parts_with_header(Some("whatever"));
        let err = AdminKey::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_key() {
        let state = state_with_admin_key(Some("super-secret")).await;

        let mut parts = parts_with_header(None);
        let err = AdminKey::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));

        let mut parts = parts_with_header(Some("guess"));
        let err = AdminKey::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));
    }

    #[tokio::test]
    async fn accepts_exact_key_and_lists_everything() {
        let state = state_with_admin_key(Some("super-secret")).await;
        let mut parts = parts_with_header(Some("super-secret"));
        AdminKey::from_request_parts(&mut parts, &state)
            .await
            .expect("exact key accepted");

        let a = state.store.create_user("A", "a@x.com", "h").await.unwrap();
        let b = state.store.create_user("B", "b@x.com", "h").await.unwrap();
        state.store.create_task(a.id, "one", None).await.unwrap();
        state.store.create_task(b.id, "two", None).await.unwrap();

        let Json(users) = list_users(State(state.clone()), AdminKey).await.unwrap();
        assert_eq!(users.len(), 2);

        let Json(tasks) = list_tasks(State(state), AdminKey).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_ne!(tasks[0].user_id, tasks[1].user_id);
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::ApiError,
    state::AppState,
};

use super::dto::{TaskCreate, TaskOut, TaskUpdate};

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TaskOut>>, ApiError> {
    let tasks = state.store.list_tasks(user_id).await?;
    Ok(Json(tasks.into_iter().map(TaskOut::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TaskCreate>,
) -> Result<(StatusCode, Json<TaskOut>), ApiError> {
    payload.validate()?;
    let task = state
        .store
        .create_task(user_id, payload.title.trim(), payload.description.as_deref())
        .await?;
    info!(user_id, task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskOut>, ApiError> {
    // Owner filtering happens in the store; a foreign task comes back as
    // None and is reported exactly like a missing one.
    let task = state
        .store
        .get_task(user_id, task_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<TaskOut>, ApiError> {
    payload.validate()?;
    let task = state
        .store
        .update_task(user_id, task_id, payload.into_patch())
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    info!(user_id, task_id, "task updated");
    Ok(Json(task.into()))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_task(user_id, task_id).await? {
        return Err(ApiError::NotFound("task"));
    }
    info!(user_id, task_id, "task deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn state_with_user(email: &str) -> (AppState, i64) {
        let state = AppState::for_tests().await;
        let user = state
            .store
            .create_user("Test User", email, "fake-hash")
            .await
            .expect("create user");
        (state, user.id)
    }

    fn create_body(title: &str) -> Json<TaskCreate> {
        Json(TaskCreate { title: title.into(), description: None })
    }

    #[tokio::test]
    async fn created_task_starts_not_done() {
        let (state, user_id) = state_with_user("ann@x.com").await;
        let (status, Json(task)) = create_task(
            State(state.clone()),
            AuthUser(user_id),
            create_body("buy milk"),
        )
        .await
        .expect("create");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task.title, "buy milk");
        assert!(!task.done);

        let Json(tasks) = list_tasks(State(state), AuthUser(user_id)).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn foreign_task_reads_as_not_found() {
        let (state, owner) = state_with_user("ann@x.com").await;
        let other = state
            .store
            .create_user("Bob", "bob@x.com", "fake-hash")
            .await
            .unwrap()
            .id;

        let (_, Json(task)) = create_task(
            State(state.clone()),
            AuthUser(owner),
            create_body("secret plans"),
        )
        .await
        .unwrap();

        let err = get_task(State(state.clone()), AuthUser(other), Path(task.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("task")));

        let err = update_task(
            State(state.clone()),
            AuthUser(other),
            Path(task.id),
            Json(TaskUpdate { title: None, description: None, done: Some(true) }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("task")));

        let err = delete_task(State(state.clone()), AuthUser(other), Path(task.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("task")));

        // A genuinely absent task gets the identical outcome.
        let err = get_task(State(state), AuthUser(other), Path(999_999))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("task")));
    }

    #[tokio::test]
    async fn update_marks_done_and_empty_patch_is_rejected() {
        let (state, user_id) = state_with_user("ann@x.com").await;
        let (_, Json(task)) = create_task(
            State(state.clone()),
            AuthUser(user_id),
            create_body("buy milk"),
        )
        .await
        .unwrap();

        let Json(updated) = update_task(
            State(state.clone()),
            AuthUser(user_id),
            Path(task.id),
            Json(TaskUpdate { title: None, description: None, done: Some(true) }),
        )
        .await
        .unwrap();
        assert!(updated.done);

        let err = update_task(
            State(state),
            AuthUser(user_id),
            Path(task.id),
            Json(TaskUpdate { title: None, description: None, done: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let (state, user_id) = state_with_user("ann@x.com").await;
        let (_, Json(task)) = create_task(
            State(state.clone()),
            AuthUser(user_id),
            create_body("temp"),
        )
        .await
        .unwrap();

        delete_task(State(state.clone()), AuthUser(user_id), Path(task.id))
            .await
            .expect("delete");
        let err = get_task(State(state), AuthUser(user_id), Path(task.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("task")));
    }
}

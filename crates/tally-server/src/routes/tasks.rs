use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use tally_core::AppError;
use tally_core::task::{NewTask, TaskFilter, TaskUpdate};

use crate::dto::{
    CreateTaskRequest, ListTasksQuery, SubtaskListResponse, SubtaskResponse, TaskListResponse,
    TaskResponse, UpdateTaskRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/tasks", post(create_task))
        .route("/v1/tasks", get(list_tasks))
        .route("/v1/tasks/{id}", get(get_task))
        .route("/v1/tasks/{id}", put(update_task))
        .route("/v1/tasks/{id}", delete(delete_task))
        .route("/v1/tasks/{id}/complete", post(complete_task))
        .route("/v1/tasks/{id}/reopen", post(reopen_task))
        .route("/v1/tasks/{id}/subtasks", get(task_subtasks))
}

#[utoipa::path(
    post,
    path = "/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Assignee not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_task: NewTask = body.into();
    new_task.validate()?;

    let task = state.db.task_repo().create(&new_task).await?;

    Ok((StatusCode::CREATED, axum::Json(TaskResponse::from(task))))
}

#[utoipa::path(
    get,
    path = "/v1/tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "List of tasks", body = TaskListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTasksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TaskFilter {
        assigned_to: query.assigned_to,
        completed: query.completed,
        tag: query.tag,
        limit: query.limit.unwrap_or(50).min(200),
    };

    let tasks = state.db.task_repo().list(&filter).await?;
    let total = tasks.len();

    let response = TaskListResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .db
        .task_repo()
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("task", id))?;

    Ok(axum::Json(TaskResponse::from(task)))
}

#[utoipa::path(
    put,
    path = "/v1/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update: TaskUpdate = body.into();
    update.validate()?;

    let task = state
        .db
        .task_repo()
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("task", id))?;

    Ok(axum::Json(TaskResponse::from(task)))
}

#[utoipa::path(
    delete,
    path = "/v1/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.task_repo().delete(id).await? {
        return Err(AppError::not_found("task", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task completed, points awarded", body = TaskResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Already completed", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.db.task_repo().complete(id).await?;

    Ok(axum::Json(TaskResponse::from(task)))
}

#[utoipa::path(
    post,
    path = "/v1/tasks/{id}/reopen",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task reopened, award reverted", body = TaskResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Not completed", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn reopen_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.db.task_repo().reopen(id).await?;

    Ok(axum::Json(TaskResponse::from(task)))
}

#[utoipa::path(
    get,
    path = "/v1/tasks/{id}/subtasks",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Subtasks of the task", body = SubtaskListResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn task_subtasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.task_repo().get(id).await?.is_none() {
        return Err(AppError::not_found("task", id).into());
    }

    let subtasks = state.db.task_repo().list_subtasks(id).await?;
    let total = subtasks.len();

    let response = SubtaskListResponse {
        subtasks: subtasks.into_iter().map(SubtaskResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

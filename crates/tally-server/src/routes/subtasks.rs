use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use tally_core::AppError;
use tally_core::task::{NewSubtask, SubtaskUpdate};

use crate::dto::{
    CreateSubtaskRequest, ListSubtasksQuery, SubtaskListResponse, SubtaskResponse,
    UpdateSubtaskRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/subtasks", post(create_subtask))
        .route("/v1/subtasks", get(list_subtasks))
        .route("/v1/subtasks/{id}", get(get_subtask))
        .route("/v1/subtasks/{id}", put(update_subtask))
        .route("/v1/subtasks/{id}", delete(delete_subtask))
}

#[utoipa::path(
    post,
    path = "/v1/subtasks",
    request_body = CreateSubtaskRequest,
    responses(
        (status = 201, description = "Subtask created", body = SubtaskResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Parent task not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn create_subtask(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateSubtaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_subtask: NewSubtask = body.into();
    new_subtask.validate()?;

    let subtask = state.db.task_repo().create_subtask(&new_subtask).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(SubtaskResponse::from(subtask)),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/subtasks",
    params(ListSubtasksQuery),
    responses(
        (status = 200, description = "Subtasks of a task", body = SubtaskListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSubtasksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let subtasks = state.db.task_repo().list_subtasks(query.task_id).await?;
    let total = subtasks.len();

    let response = SubtaskListResponse {
        subtasks: subtasks.into_iter().map(SubtaskResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/subtasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Subtask ID")
    ),
    responses(
        (status = 200, description = "Subtask details", body = SubtaskResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn get_subtask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subtask = state
        .db
        .task_repo()
        .get_subtask(id)
        .await?
        .ok_or_else(|| AppError::not_found("subtask", id))?;

    Ok(axum::Json(SubtaskResponse::from(subtask)))
}

#[utoipa::path(
    put,
    path = "/v1/subtasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Subtask ID")
    ),
    request_body = UpdateSubtaskRequest,
    responses(
        (status = 200, description = "Updated subtask", body = SubtaskResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn update_subtask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateSubtaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update: SubtaskUpdate = body.into();
    if let Some(text) = &update.text {
        tally_core::models::validate_non_empty("text", text)?;
    }

    let subtask = state
        .db
        .task_repo()
        .update_subtask(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("subtask", id))?;

    Ok(axum::Json(SubtaskResponse::from(subtask)))
}

#[utoipa::path(
    delete,
    path = "/v1/subtasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Subtask ID")
    ),
    responses(
        (status = 204, description = "Subtask deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn delete_subtask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.task_repo().delete_subtask(id).await? {
        return Err(AppError::not_found("subtask", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

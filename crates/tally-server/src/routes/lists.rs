use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use tally_core::AppError;
use tally_core::task::{ListUpdate, NewList};

use crate::dto::{
    AddListTaskRequest, CreateListRequest, ListListsQuery, ListResponse, ListsResponse,
    UpdateListRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/lists", post(create_list))
        .route("/v1/lists", get(list_lists))
        .route("/v1/lists/{id}", get(get_list))
        .route("/v1/lists/{id}", put(update_list))
        .route("/v1/lists/{id}", delete(delete_list))
        .route("/v1/lists/{id}/tasks", post(add_task))
        .route("/v1/lists/{id}/tasks/{task_id}", delete(remove_task))
}

#[utoipa::path(
    post,
    path = "/v1/lists",
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = ListResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_list: NewList = body.into();
    new_list.validate()?;

    let list = state.db.list_repo().create(&new_list).await?;

    Ok((StatusCode::CREATED, axum::Json(ListResponse::from(list))))
}

#[utoipa::path(
    get,
    path = "/v1/lists",
    params(ListListsQuery),
    responses(
        (status = 200, description = "All lists", body = ListsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn list_lists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListListsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);
    let lists = state.db.list_repo().list(limit).await?;
    let total = lists.len();

    let response = ListsResponse {
        lists: lists.into_iter().map(ListResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/lists/{id}",
    params(
        ("id" = Uuid, Path, description = "List ID")
    ),
    responses(
        (status = 200, description = "List details", body = ListResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state
        .db
        .list_repo()
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("list", id))?;

    Ok(axum::Json(ListResponse::from(list)))
}

#[utoipa::path(
    put,
    path = "/v1/lists/{id}",
    params(
        ("id" = Uuid, Path, description = "List ID")
    ),
    request_body = UpdateListRequest,
    responses(
        (status = 200, description = "Updated list", body = ListResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn update_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update: ListUpdate = body.into();
    if let Some(name) = &update.name {
        tally_core::models::validate_non_empty("name", name)?;
    }

    let list = state
        .db
        .list_repo()
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("list", id))?;

    Ok(axum::Json(ListResponse::from(list)))
}

#[utoipa::path(
    delete,
    path = "/v1/lists/{id}",
    params(
        ("id" = Uuid, Path, description = "List ID")
    ),
    responses(
        (status = 204, description = "List deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.list_repo().delete(id).await? {
        return Err(AppError::not_found("list", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/lists/{id}/tasks",
    params(
        ("id" = Uuid, Path, description = "List ID")
    ),
    request_body = AddListTaskRequest,
    responses(
        (status = 200, description = "Task added to list", body = ListResponse),
        (status = 404, description = "List or task not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn add_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<AddListTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state
        .db
        .list_repo()
        .add_task(id, body.task_id)
        .await?
        .ok_or_else(|| AppError::not_found("list", id))?;

    Ok(axum::Json(ListResponse::from(list)))
}

#[utoipa::path(
    delete,
    path = "/v1/lists/{id}/tasks/{task_id}",
    params(
        ("id" = Uuid, Path, description = "List ID"),
        ("task_id" = Uuid, Path, description = "Task ID"),
    ),
    responses(
        (status = 200, description = "Task removed from list", body = ListResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "lists"
)]
pub async fn remove_task(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state
        .db
        .list_repo()
        .remove_task(id, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("list", id))?;

    Ok(axum::Json(ListResponse::from(list)))
}

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use tally_core::AppError;
use tally_core::models::{NewUser, UserUpdate};

use crate::dto::{
    CreateUserRequest, ListUsersQuery, PrizeListResponse, PrizeResponse, UpdateUserRequest,
    UserListResponse, UserResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users", get(list_users))
        .route("/v1/users/{id}", get(get_user))
        .route("/v1/users/{id}", put(update_user))
        .route("/v1/users/{id}", delete(delete_user))
        .route("/v1/users/{id}/inventory", get(inventory))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user: NewUser = body.into();
    new_user.validate()?;

    let user = state.db.user_repo().create(&new_user).await?;

    Ok((StatusCode::CREATED, axum::Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);
    let users = state.db.user_repo().list(limit).await?;
    let total = users.len();

    let response = UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .user_repo()
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))?;

    Ok(axum::Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update: UserUpdate = body.into();
    update.validate()?;

    let user = state
        .db
        .user_repo()
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))?;

    Ok(axum::Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.user_repo().delete(id).await? {
        return Err(AppError::not_found("user", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/inventory",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Prizes owned by or shared with the user", body = PrizeListResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn inventory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.user_repo().get(id).await?.is_none() {
        return Err(AppError::not_found("user", id).into());
    }

    let prizes = state.db.prize_repo().inventory(id).await?;
    let total = prizes.len();

    let response = PrizeListResponse {
        prizes: prizes.into_iter().map(PrizeResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use uuid::Uuid;

use tally_core::AppError;
use tally_db::PrizeFilter;

use crate::dto::{ListPrizesQuery, PrizeListResponse, PrizeResponse, SharePrizeRequest};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/prizes", get(list_prizes))
        .route("/v1/prizes/{id}", get(get_prize))
        .route("/v1/prizes/{id}", delete(delete_prize))
        .route("/v1/prizes/{id}/share", post(share_prize))
        .route("/v1/prizes/{id}/share/{user_id}", delete(unshare_prize))
        .route("/v1/prizes/{id}/complete", post(complete_prize))
}

#[utoipa::path(
    get,
    path = "/v1/prizes",
    params(ListPrizesQuery),
    responses(
        (status = 200, description = "List of prizes", body = PrizeListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn list_prizes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPrizesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PrizeFilter {
        owner_id: query.owner_id,
        shared_with: query.shared_with,
        include_completed: query.include_completed.unwrap_or(false),
        limit: query.limit.unwrap_or(50).min(200),
    };

    let prizes = state.db.prize_repo().list_prizes(&filter).await?;
    let total = prizes.len();

    let response = PrizeListResponse {
        prizes: prizes.into_iter().map(PrizeResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/prizes/{id}",
    params(
        ("id" = Uuid, Path, description = "Prize ID")
    ),
    responses(
        (status = 200, description = "Prize details", body = PrizeResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn get_prize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = state
        .db
        .prize_repo()
        .get_prize(id)
        .await?
        .ok_or_else(|| AppError::not_found("prize", id))?;

    Ok(axum::Json(PrizeResponse::from(prize)))
}

#[utoipa::path(
    post,
    path = "/v1/prizes/{id}/share",
    params(
        ("id" = Uuid, Path, description = "Prize ID")
    ),
    request_body = SharePrizeRequest,
    responses(
        (status = 200, description = "Prize shared", body = PrizeResponse),
        (status = 404, description = "Prize or user not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn share_prize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<SharePrizeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = state
        .db
        .prize_repo()
        .share(id, body.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("prize", id))?;

    Ok(axum::Json(PrizeResponse::from(prize)))
}

#[utoipa::path(
    delete,
    path = "/v1/prizes/{id}/share/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Prize ID"),
        ("user_id" = Uuid, Path, description = "User to revoke"),
    ),
    responses(
        (status = 200, description = "Share revoked", body = PrizeResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn unshare_prize(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = state
        .db
        .prize_repo()
        .unshare(id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("prize", id))?;

    Ok(axum::Json(PrizeResponse::from(prize)))
}

#[utoipa::path(
    post,
    path = "/v1/prizes/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Prize ID")
    ),
    responses(
        (status = 200, description = "Prize marked consumed", body = PrizeResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Already consumed", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn complete_prize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = state.db.prize_repo().complete_prize(id).await?;

    Ok(axum::Json(PrizeResponse::from(prize)))
}

#[utoipa::path(
    delete,
    path = "/v1/prizes/{id}",
    params(
        ("id" = Uuid, Path, description = "Prize ID")
    ),
    responses(
        (status = 204, description = "Prize deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "prizes"
)]
pub async fn delete_prize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.prize_repo().delete_prize(id).await? {
        return Err(AppError::not_found("prize", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

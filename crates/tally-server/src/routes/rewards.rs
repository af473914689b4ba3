use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use tally_core::AppError;
use tally_core::models::{NewReward, RewardUpdate};

use crate::dto::{
    CreateRewardRequest, ListRewardsQuery, PrizeResponse, RedeemRequest, RewardListResponse,
    RewardResponse, UpdateRewardRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/rewards", post(create_reward))
        .route("/v1/rewards", get(list_rewards))
        .route("/v1/rewards/{id}", get(get_reward))
        .route("/v1/rewards/{id}", put(update_reward))
        .route("/v1/rewards/{id}", delete(delete_reward))
        .route("/v1/rewards/{id}/redeem", post(redeem))
}

#[utoipa::path(
    post,
    path = "/v1/rewards",
    request_body = CreateRewardRequest,
    responses(
        (status = 201, description = "Reward created", body = RewardResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Owner not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn create_reward(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateRewardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_reward: NewReward = body.into();
    new_reward.validate()?;

    let reward = state.db.prize_repo().create_reward(&new_reward).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(RewardResponse::from(reward)),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/rewards",
    params(ListRewardsQuery),
    responses(
        (status = 200, description = "Reward catalog", body = RewardListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn list_rewards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRewardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);
    let rewards = state.db.prize_repo().list_rewards(limit).await?;
    let total = rewards.len();

    let response = RewardListResponse {
        rewards: rewards.into_iter().map(RewardResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/rewards/{id}",
    params(
        ("id" = Uuid, Path, description = "Reward ID")
    ),
    responses(
        (status = 200, description = "Reward details", body = RewardResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn get_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reward = state
        .db
        .prize_repo()
        .get_reward(id)
        .await?
        .ok_or_else(|| AppError::not_found("reward", id))?;

    Ok(axum::Json(RewardResponse::from(reward)))
}

#[utoipa::path(
    put,
    path = "/v1/rewards/{id}",
    params(
        ("id" = Uuid, Path, description = "Reward ID")
    ),
    request_body = UpdateRewardRequest,
    responses(
        (status = 200, description = "Updated reward", body = RewardResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn update_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateRewardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update: RewardUpdate = body.into();
    update.validate()?;

    let reward = state
        .db
        .prize_repo()
        .update_reward(id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("reward", id))?;

    Ok(axum::Json(RewardResponse::from(reward)))
}

#[utoipa::path(
    delete,
    path = "/v1/rewards/{id}",
    params(
        ("id" = Uuid, Path, description = "Reward ID")
    ),
    responses(
        (status = 204, description = "Reward deleted"),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn delete_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.prize_repo().delete_reward(id).await? {
        return Err(AppError::not_found("reward", id).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/rewards/{id}/redeem",
    params(
        ("id" = Uuid, Path, description = "Reward ID")
    ),
    request_body = RedeemRequest,
    responses(
        (status = 201, description = "Prize placed in the user's inventory", body = PrizeResponse),
        (status = 404, description = "Reward or user not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Insufficient points", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "rewards"
)]
pub async fn redeem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<RedeemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = state.db.prize_repo().redeem(id, body.user_id).await?;

    Ok((StatusCode::CREATED, axum::Json(PrizeResponse::from(prize))))
}

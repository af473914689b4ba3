use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;

use tally_core::AppError;

use crate::dto::{MediaDeleteRequest, MediaDeleteResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/v1/media/delete", post(delete_media))
}

#[utoipa::path(
    post,
    path = "/v1/media/delete",
    request_body = MediaDeleteRequest,
    responses(
        (status = 200, description = "Deletion result from Cloudinary", body = MediaDeleteResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 500, description = "Cloudinary not configured", body = crate::dto::ErrorResponse),
        (status = 502, description = "Cloudinary error", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "media"
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<MediaDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.public_id.trim().is_empty() {
        return Err(AppError::Validation("public_id must not be empty".into()).into());
    }

    let cloudinary = state.cloudinary.as_ref().ok_or_else(|| {
        AppError::Config("Cloudinary credentials not configured on this server".into())
    })?;

    let result = cloudinary.destroy(&body.public_id).await?;

    Ok(axum::Json(MediaDeleteResponse { result }))
}

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;

use super::dto::MediaResponse;
use super::service::MediaService;
use super::storage::MediaCategory;

#[utoipa::path(
    post,
    path = "/api/v1/media/{category}",
    params(
        ("category" = String, Path, description = "posts | clips | avatars | comments")
    ),
    responses(
        (status = 201, description = "Media Stored", body = ApiResponse<MediaResponse>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Media"
)]
pub async fn upload_media(
    State(state): State<AppState>,
    Path(category): Path<String>,
    multipart: Multipart,
) -> impl IntoResponse {
    let Ok(category) = category.parse::<MediaCategory>() else {
        return ApiError(format!("unknown category '{}'", category), StatusCode::BAD_REQUEST)
            .into_response();
    };
    match MediaService::upload(state, category, multipart).await {
        Ok(res) => {
            ApiSuccess(ApiResponse::success(res, "Media stored"), StatusCode::CREATED)
                .into_response()
        }
        Err(e) => ApiError::internal(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/media/{id}",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    responses(
        (status = 200, description = "Media Info", body = ApiResponse<MediaResponse>),
        (status = 404, description = "Not Found")
    ),
    tag = "Media"
)]
pub async fn get_media(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match MediaService::media_info(&state, id) {
        Some(res) => {
            ApiSuccess(ApiResponse::success(res, "Media retrieved"), StatusCode::OK)
                .into_response()
        }
        None => ApiError::not_found("media not found").into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/media/{id}",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    responses(
        (status = 200, description = "Media Deleted"),
        (status = 404, description = "Not Found")
    ),
    tag = "Media"
)]
pub async fn delete_media(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match MediaService::delete(&state, id) {
        Some(()) => {
            ApiSuccess(ApiResponse::success((), "Media deleted"), StatusCode::OK).into_response()
        }
        None => ApiError::not_found("media not found").into_response(),
    }
}

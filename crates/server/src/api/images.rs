use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use medverify_pipeline::PipelineError;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// `GET /v1/images/{id}` -- serve a stored image with its content type.
#[utoipa::path(
    get,
    path = "/v1/images/{id}",
    tag = "Images",
    summary = "Fetch image",
    params(("id" = String, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "No such image", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let (meta, data) = state
        .images
        .get(&id)
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?
        .ok_or_else(|| PipelineError::NotFound(format!("image {id}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, meta.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_owned()),
        ],
        data,
    ))
}

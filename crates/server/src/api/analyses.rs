use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use tracing::{debug, info};

use medverify_core::{AnalysisRecord, Principal};
use medverify_pipeline::{InstanceReport, PipelineError, Upload};
use medverify_records::HistoryQuery;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, StatsResponse, UploadForm};

/// Multipart field name carrying image files.
const FILE_FIELD: &str = "file";

/// `POST /v1/analyses` -- upload one or more images and analyze each.
///
/// Non-image parts are skipped. Every image runs as its own pipeline
/// instance, so the response is `200` even when some instances failed.
#[utoipa::path(
    post,
    path = "/v1/analyses",
    tag = "Analysis",
    summary = "Upload and analyze images",
    description = "Accepts multipart `file` fields. Each image is stored, analyzed and persisted independently; failures are reported per image.",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "One report per image", body = Vec<InstanceReport>),
        (status = 400, description = "Malformed multipart body", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
pub async fn create_analyses(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    if principal.is_none() {
        return Err(PipelineError::AuthenticationRequired.into());
    }

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("multipart: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("multipart: {e}")))?;
        uploads.push(Upload::new(filename, content_type, data));
    }
    debug!(files = uploads.len(), "multipart upload received");

    let pipeline = Arc::clone(&state.pipeline);
    let reports = tokio::spawn(async move { pipeline.submit_batch(principal.as_ref(), uploads).await })
        .await
        .map_err(|e| PipelineError::Internal(format!("upload task failed: {e}")))??;
    Ok(Json(reports))
}

/// `GET /v1/analyses` -- the caller's analysis history, newest first.
#[utoipa::path(
    get,
    path = "/v1/analyses",
    tag = "History",
    summary = "List analyses",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<AnalysisRecord>),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
pub async fn list_analyses(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let records = state.history.list(principal.as_ref(), &query).await?;
    Ok(Json(records))
}

/// `GET /v1/analyses/{id}` -- one of the caller's analyses.
#[utoipa::path(
    get,
    path = "/v1/analyses/{id}",
    tag = "History",
    summary = "Get analysis",
    params(("id" = String, Path, description = "Record ID")),
    responses(
        (status = 200, description = "The record", body = AnalysisRecord),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "No such record", body = ErrorResponse)
    )
)]
pub async fn get_analysis(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let record = state.history.get(principal.as_ref(), &id).await?;
    Ok(Json(record))
}

/// `DELETE /v1/analyses/{id}` -- permanently delete one of the caller's analyses.
#[utoipa::path(
    delete,
    path = "/v1/analyses/{id}",
    tag = "History",
    summary = "Delete analysis",
    params(("id" = String, Path, description = "Record ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Owned by another user; nothing was deleted", body = ErrorResponse),
        (status = 404, description = "No such record", body = ErrorResponse)
    )
)]
pub async fn delete_analysis(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state.history.delete(principal.as_ref(), &id).await?;
    info!(record_id = %id, "analysis deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/analyses/stats` -- per-verdict totals for the caller.
#[utoipa::path(
    get,
    path = "/v1/analyses/stats",
    tag = "History",
    summary = "Verdict statistics",
    responses(
        (status = 200, description = "Counts per verdict", body = StatsResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
pub async fn analysis_stats(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
) -> Result<impl IntoResponse, ServerError> {
    let counts = state.history.stats(principal.as_ref()).await?;
    Ok(Json(StatsResponse::from(counts)))
}

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use medverify_core::{AnalysisRecord, ImageReference, Principal};
use medverify_pipeline::PipelineError;

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// Body of `POST /analyze-medicine`.
///
/// Every field is optional at the wire level so that a missing one yields
/// a `400` with a readable message rather than a deserialization error.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// URL of an already uploaded image.
    #[schema(example = "http://localhost:8080/v1/images/0190c7e4-5a1b-7c3d-9e8f-0a1b2c3d4e5f")]
    pub image_url: Option<String>,
    /// Display name of the image.
    #[schema(example = "blister-pack.jpg")]
    pub image_name: Option<String>,
    /// The submitting user. Must match the bearer token's subject when
    /// auth is enabled.
    #[schema(example = "user-123")]
    pub user_id: Option<String>,
}

/// `POST /analyze-medicine` -- analyze an uploaded image and store the result.
#[utoipa::path(
    post,
    path = "/analyze-medicine",
    tag = "Analysis",
    summary = "Analyze an uploaded image",
    description = "Runs the verdict engine on an image that is already stored and persists the outcome.",
    request_body(content = AnalyzeRequest, description = "Image to analyze"),
    responses(
        (status = 200, description = "Analysis stored", body = AnalysisRecord),
        (status = 400, description = "Malformed body, missing field, or the analysis failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "userId does not match the caller", body = ErrorResponse)
    )
)]
pub async fn analyze_medicine(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Json(body) = payload?;
    let image_url = required(body.image_url, "imageUrl")?;
    let image_name = required(body.image_name, "imageName")?;
    let user_id = body.user_id.filter(|id| !id.is_empty());

    let principal = resolve_principal(state.auth_enabled(), principal, user_id)?;

    // Detached so a client disconnect does not abort the analysis.
    let pipeline = Arc::clone(&state.pipeline);
    let record = tokio::spawn(async move {
        pipeline
            .analyze_stored(
                principal.as_ref(),
                ImageReference::remote(image_url, image_name),
            )
            .await
    })
    .await
    .map_err(|e| PipelineError::Internal(format!("analysis task failed: {e}")))??;

    info!(
        record_id = %record.id,
        owner = %record.owner_id,
        verdict = %record.verdict,
        confidence = %record.confidence_score,
        "analysis stored"
    );
    Ok(Json(record))
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("{field} is required")))
}

/// Decide who the analysis runs for.
///
/// With auth enabled the token subject wins and a conflicting `userId` is
/// forbidden. Without auth, the body's `userId` (or the `x-user-id` header)
/// names the caller.
fn resolve_principal(
    auth_enabled: bool,
    principal: Option<Principal>,
    user_id: Option<String>,
) -> Result<Option<Principal>, ServerError> {
    if auth_enabled {
        let Some(principal) = principal else {
            return Err(PipelineError::AuthenticationRequired.into());
        };
        if let Some(user_id) = user_id
            && !principal.owns(&user_id)
        {
            return Err(PipelineError::Forbidden(format!(
                "userId {user_id} does not match the authenticated user"
            ))
            .into());
        }
        return Ok(Some(principal));
    }

    Ok(user_id
        .map(|id| Principal::new(id, "body"))
        .or(principal))
}

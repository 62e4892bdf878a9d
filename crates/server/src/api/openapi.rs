#![allow(clippy::needless_for_each)]

use medverify_core::{AnalysisRecord, Confidence, Verdict, VerdictOutcome};
use medverify_pipeline::{InstanceReport, MetricsSnapshot, PipelineEvent, PipelineState};
use medverify_records::{HistoryQuery, VerdictCounts};

use super::analyze::AnalyzeRequest;
use super::schemas::{ErrorResponse, HealthResponse, StatsResponse, UploadForm};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Medverify API",
        version = "0.1.0",
        description = "HTTP API for checking medicine packaging photos for signs of counterfeiting. Upload images, read back verdicts and manage analysis history.",
        license(name = "MIT")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Analysis", description = "Image upload and verdict analysis"),
        (name = "History", description = "Past analyses of the calling user"),
        (name = "Images", description = "Stored image retrieval")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::analyze::analyze_medicine,
        super::analyses::create_analyses,
        super::analyses::list_analyses,
        super::analyses::get_analysis,
        super::analyses::delete_analysis,
        super::analyses::analysis_stats,
        super::stream::stream,
        super::images::get_image,
    ),
    components(schemas(
        Verdict, Confidence, VerdictOutcome, AnalysisRecord,
        PipelineState, PipelineEvent, InstanceReport, MetricsSnapshot,
        HistoryQuery, VerdictCounts,
        AnalyzeRequest, UploadForm, StatsResponse, HealthResponse, ErrorResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/metrics",
            "/analyze-medicine",
            "/v1/analyses",
            "/v1/analyses/{id}",
            "/v1/analyses/stats",
            "/v1/analyses/events",
            "/v1/images/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

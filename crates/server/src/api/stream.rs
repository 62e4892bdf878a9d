//! Live pipeline state over Server-Sent Events.
//!
//! `GET /v1/analyses/events` streams the caller's own [`PipelineEvent`]s as
//! instances move through uploading, analyzing and their terminal state.
//! Slow clients that fall behind get a `lagged` event and resume from the
//! newest event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use medverify_core::Principal;
use medverify_pipeline::{PipelineError, PipelineEvent};

use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

/// `GET /v1/analyses/events` -- subscribe to the caller's pipeline events.
#[utoipa::path(
    get,
    path = "/v1/analyses/events",
    tag = "Analysis",
    summary = "Stream pipeline events",
    description = "Server-Sent Events; each event is named after the new state and carries a PipelineEvent as JSON.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = PipelineEvent),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn stream(
    State(state): State<AppState>,
    axum::Extension(principal): axum::Extension<Option<Principal>>,
) -> Result<impl IntoResponse, ServerError> {
    let principal = principal.ok_or(PipelineError::AuthenticationRequired)?;
    debug!(owner = %principal.id, "pipeline event stream opened");

    let rx = state.pipeline.subscribe();
    Ok(Sse::new(make_event_stream(rx, principal.id)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

fn make_event_stream(
    rx: broadcast::Receiver<PipelineEvent>,
    owner_id: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) => {
            if !event.is_visible_to(&owner_id) {
                return None;
            }
            match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default()
                    .id(event.instance_id.clone())
                    .event(event.state.as_str())
                    .data(json))),
                Err(e) => {
                    warn!(error = %e, "failed to serialize pipeline event");
                    None
                }
            }
        }
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            debug!(skipped = n, "SSE client lagged, skipping events");
            Some(Ok(Event::default()
                .event("lagged")
                .data(format!("{{\"skipped\":{n}}}"))))
        }
    })
}

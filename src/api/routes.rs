//! Stage handlers.
//!
//! Every handler touches the session from the blocking pool while holding
//! its lock, so stage calls never interleave. The replay only holds the lock
//! long enough to snapshot its inputs.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, State},
    response::{
        sse::{Event, Sse},
        Json,
    },
};
use futures_util::{Stream, StreamExt};
use tracing::{info, warn};

use super::{error::ApiError, AppState};
use crate::models::{DateRanges, HealthResponse, TrainResponse};
use crate::pipeline::{
    self, DatasetSummary, PartitionOutcome, PipelineError, ReplaySnapshot, WindowSet,
};

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /api/upload (multipart field `file`)
pub async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DatasetSummary>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Format(format!("Could not read file: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::Format(format!("Could not read file: {e}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(PipelineError::Format("No file uploaded.".into()).into());
    };
    info!(file = %file_name, bytes = bytes.len(), "upload received");

    let session = state.session.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let mut session = session.lock();
        pipeline::ingest(&mut session, &bytes, &file_name)
    })
    .await??;

    Ok(Json(summary))
}

/// POST /api/validate-date-ranges
pub async fn validate_date_ranges(
    State(state): State<AppState>,
    Json(ranges): Json<DateRanges>,
) -> Result<Json<PartitionOutcome>, ApiError> {
    let windows = WindowSet::from(&ranges);
    let session = state.session.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut session = session.lock();
        pipeline::partition(&mut session, &windows)
    })
    .await??;

    Ok(Json(outcome))
}

/// POST /api/train-model
///
/// The payload is accepted for compatibility; the windows used are the ones
/// stored by the last successful validation.
pub async fn train_model(
    State(state): State<AppState>,
    Json(_ranges): Json<DateRanges>,
) -> Result<Json<TrainResponse>, ApiError> {
    let params = state.config.booster_params();
    let session = state.session.clone();
    let metrics = tokio::task::spawn_blocking(move || {
        let mut session = session.lock();
        pipeline::train(&mut session, &params)
    })
    .await??;

    Ok(Json(TrainResponse::trained(metrics)))
}

/// GET /api/simulate (server-sent events)
pub async fn simulate_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = state.session.clone();
    let snapshot =
        tokio::task::spawn_blocking(move || ReplaySnapshot::capture(&session.lock())).await??;
    info!(rows = snapshot.n_events(), "replay started");

    let events = snapshot
        .into_stream(state.config.simulation_delay())
        .filter_map(|event| async move {
            match Event::default().json_data(&event) {
                Ok(frame) => Some(Ok(frame)),
                Err(e) => {
                    warn!("Failed to serialize replay event: {}", e);
                    None
                }
            }
        });

    Ok(Sse::new(events))
}

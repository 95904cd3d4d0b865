use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::models::ErrorBody;
use crate::pipeline::PipelineError;

#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    /// The blocking stage task panicked or was cancelled.
    Join(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Join(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Pipeline(err) => match err {
                PipelineError::Format(msg)
                | PipelineError::Schema(msg)
                | PipelineError::NotReady(msg) => (StatusCode::BAD_REQUEST, msg),
                PipelineError::Internal(msg) => {
                    tracing::error!("Pipeline failure: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, msg)
                }
            },
            ApiError::Join(msg) => {
                tracing::error!("Stage task failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

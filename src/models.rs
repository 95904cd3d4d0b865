//! Request and response bodies of the HTTP surface.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pipeline::{EvaluationMetrics, TimeWindow, WindowSet};
use crate::table::timestamp::deserialize_iso;

/// Six ISO-8601 boundaries for the train / test / simulate windows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRanges {
    #[serde(deserialize_with = "deserialize_iso")]
    pub train_start: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_iso")]
    pub train_end: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_iso")]
    pub test_start: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_iso")]
    pub test_end: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_iso")]
    pub sim_start: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_iso")]
    pub sim_end: NaiveDateTime,
}

impl From<&DateRanges> for WindowSet {
    fn from(r: &DateRanges) -> Self {
        Self {
            train: TimeWindow::new(r.train_start, r.train_end),
            test: TimeWindow::new(r.test_start, r.test_end),
            simulate: TimeWindow::new(r.sim_start, r.sim_end),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub metrics: EvaluationMetrics,
}

impl TrainResponse {
    pub fn trained(metrics: EvaluationMetrics) -> Self {
        Self {
            status: "model_trained",
            metrics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

//! Row-by-row replay of the test slice through the fitted model.
//!
//! The replay works from a snapshot taken when it starts, so retraining or
//! re-ingesting while a replay is running does not affect it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, Stream};
use serde::Serialize;
use tracing::debug;

use super::session::Session;
use super::PipelineError;
use crate::classifier::FittedModel;
use crate::features::expand_row;
use crate::table::{format_timestamp, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationEvent {
    pub timestamp: String,
    pub predicted: u8,
    pub actual: u8,
}

#[derive(Debug, Clone)]
pub struct ReplaySnapshot {
    test: Arc<Table>,
    model: Arc<FittedModel>,
}

impl ReplaySnapshot {
    pub fn capture(session: &Session) -> Result<Self, PipelineError> {
        let (test, model) = session.require_test_and_model()?;
        Ok(Self { test, model })
    }

    pub fn n_events(&self) -> usize {
        self.test.n_rows()
    }

    pub fn event_at(&self, row: usize) -> SimulationEvent {
        let predicted = self.model.predict_observed(&expand_row(&self.test, row));
        SimulationEvent {
            timestamp: format_timestamp(&self.test.timestamps()[row]),
            predicted,
            actual: self.test.labels()[row],
        }
    }

    /// Paced event stream: `delay` between consecutive events, none before
    /// the first. Dropping the stream stops the replay.
    pub fn into_stream(self, delay: Duration) -> impl Stream<Item = SimulationEvent> + Send {
        stream::unfold((self, 0usize), move |(snapshot, row)| async move {
            if row >= snapshot.n_events() {
                debug!(rows = row, "replay finished");
                return None;
            }
            if row > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let event = snapshot.event_at(row);
            debug!(row, predicted = event.predicted, actual = event.actual, "replay event");
            Some((event, (snapshot, row + 1)))
        })
    }
}

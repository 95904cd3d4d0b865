//! Window validation and train/test/simulate slicing.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::session::Session;
use super::PipelineError;

/// Closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Strictly before `other`; touching windows do not count.
    pub fn precedes(&self, other: &TimeWindow) -> bool {
        self.end < other.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSet {
    pub train: TimeWindow,
    pub test: TimeWindow,
    pub simulate: TimeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliceCounts {
    pub training: usize,
    pub testing: usize,
    pub simulation: usize,
}

/// Result of a validation request. An invalid window set is an expected
/// outcome, reported with a message the operator can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionOutcome {
    Valid { counts: SliceCounts },
    Invalid { message: String },
}

pub const MSG_UNORDERED: &str = "Each period's start must be <= end.";
pub const MSG_NOT_SEQUENTIAL: &str =
    "Ranges must be sequential (train ends before test starts, etc.).";
pub const MSG_OUT_OF_BOUNDS: &str = "Selected dates are outside the dataset range.";

impl WindowSet {
    /// Check ordering, strict sequencing and containment within
    /// `bounds` (dataset min/max). The first failing rule wins.
    pub fn check(&self, bounds: Option<(NaiveDateTime, NaiveDateTime)>) -> Result<(), &'static str> {
        if !(self.train.is_ordered() && self.test.is_ordered() && self.simulate.is_ordered()) {
            return Err(MSG_UNORDERED);
        }
        if !(self.train.precedes(&self.test) && self.test.precedes(&self.simulate)) {
            return Err(MSG_NOT_SEQUENTIAL);
        }
        match bounds {
            Some((min, max)) if self.train.start >= min && self.simulate.end <= max => Ok(()),
            _ => Err(MSG_OUT_OF_BOUNDS),
        }
    }
}

/// Validate `windows` against the ingested dataset and, when valid, store
/// the three slices in the session.
pub fn partition(
    session: &mut Session,
    windows: &WindowSet,
) -> Result<PartitionOutcome, PipelineError> {
    let dataset = session.require_dataset()?;
    let table = &dataset.table;

    if let Err(message) = windows.check(table.time_bounds()) {
        warn!(dataset_id = %dataset.id, reason = message, "date ranges rejected");
        return Ok(PartitionOutcome::Invalid {
            message: message.to_string(),
        });
    }

    let train = table.slice_between(windows.train.start, windows.train.end);
    let test = table.slice_between(windows.test.start, windows.test.end);
    let simulate = table.slice_between(windows.simulate.start, windows.simulate.end);

    let counts = SliceCounts {
        training: train.n_rows(),
        testing: test.n_rows(),
        simulation: simulate.n_rows(),
    };
    session.install_slices(train, test, simulate);

    info!(
        dataset_id = %dataset.id,
        training = counts.training,
        testing = counts.testing,
        simulation = counts.simulation,
        "date ranges accepted"
    );
    Ok(PartitionOutcome::Valid { counts })
}

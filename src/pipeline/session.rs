//! Session slots shared by the pipeline stages.
//!
//! Each slot holds at most one artifact. Stages receive the session
//! explicitly; the HTTP layer keeps one behind a process-wide lock.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::PipelineError;
use crate::classifier::FittedModel;
use crate::table::Table;

/// An ingested upload.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: Uuid,
    pub file_name: String,
    pub table: Table,
}

impl Dataset {
    pub fn new(file_name: impl Into<String>, table: Table) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            table,
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Arc<Dataset>>,
    train: Option<Arc<Table>>,
    test: Option<Arc<Table>>,
    simulate: Option<Arc<Table>>,
    model: Option<Arc<FittedModel>>,
}

/// Session guarded by a single lock. Stage calls hold it for their whole
/// duration so no two stages interleave.
pub type SharedSession = Arc<Mutex<Session>>;

pub fn shared() -> SharedSession {
    Arc::new(Mutex::new(Session::new()))
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    pub fn train_slice(&self) -> Option<&Arc<Table>> {
        self.train.as_ref()
    }

    pub fn test_slice(&self) -> Option<&Arc<Table>> {
        self.test.as_ref()
    }

    pub fn simulation_slice(&self) -> Option<&Arc<Table>> {
        self.simulate.as_ref()
    }

    pub fn model(&self) -> Option<&Arc<FittedModel>> {
        self.model.as_ref()
    }

    /// Replace the dataset. Slices and model derived from the previous
    /// dataset are dropped with it.
    pub fn install_dataset(&mut self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.dataset = Some(dataset.clone());
        self.train = None;
        self.test = None;
        self.simulate = None;
        self.model = None;
        dataset
    }

    pub fn install_slices(&mut self, train: Table, test: Table, simulate: Table) {
        self.train = Some(Arc::new(train));
        self.test = Some(Arc::new(test));
        self.simulate = Some(Arc::new(simulate));
    }

    pub fn install_model(&mut self, model: FittedModel) {
        self.model = Some(Arc::new(model));
    }

    pub fn require_dataset(&self) -> Result<Arc<Dataset>, PipelineError> {
        self.dataset
            .clone()
            .ok_or_else(|| PipelineError::NotReady("Upload a dataset first.".into()))
    }

    pub fn require_train_and_test(&self) -> Result<(Arc<Table>, Arc<Table>), PipelineError> {
        match (&self.train, &self.test) {
            (Some(train), Some(test)) => Ok((train.clone(), test.clone())),
            _ => Err(PipelineError::NotReady(
                "Validate date ranges first.".into(),
            )),
        }
    }

    pub fn require_test_and_model(
        &self,
    ) -> Result<(Arc<Table>, Arc<FittedModel>), PipelineError> {
        let test = self.test.clone().ok_or_else(|| {
            PipelineError::NotReady("Validate date ranges first.".into())
        })?;
        let model = self
            .model
            .clone()
            .ok_or_else(|| PipelineError::NotReady("Train model first.".into()))?;
        Ok((test, model))
    }
}

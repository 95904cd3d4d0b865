//! Binary classifier and the fitted-model wrapper that binds it to a
//! feature schema.

pub mod booster;
pub mod tree;

pub use booster::{BoosterParams, GradientBoostedClassifier};

use crate::features::FeatureSchema;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    NoSamples,
    ShapeMismatch { rows: usize, labels: usize },
    RaggedRow { row: usize, expected: usize },
    InvalidParams(String),
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSamples => write!(f, "cannot fit with 0 samples"),
            Self::ShapeMismatch { rows, labels } => {
                write!(f, "feature matrix has {rows} rows but {labels} labels")
            }
            Self::RaggedRow { row, expected } => {
                write!(f, "row {row} does not have {expected} features")
            }
            Self::InvalidParams(msg) => write!(f, "invalid hyperparameters: {msg}"),
        }
    }
}

impl std::error::Error for ClassifierError {}

/// A trained classifier together with the training-time feature schema.
#[derive(Debug, Clone)]
pub struct FittedModel {
    schema: FeatureSchema,
    booster: GradientBoostedClassifier,
}

impl FittedModel {
    pub fn new(schema: FeatureSchema, booster: GradientBoostedClassifier) -> Self {
        Self { schema, booster }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn booster(&self) -> &GradientBoostedClassifier {
        &self.booster
    }

    /// Predict from an arbitrary (name, value) expansion, realigned to the
    /// training schema first.
    pub fn predict_observed(&self, observed: &[(String, f64)]) -> u8 {
        self.booster.predict(&self.schema.realign(observed))
    }
}

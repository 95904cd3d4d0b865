//! Stage-gated pipeline: ingest → partition → train → simulate.
//!
//! Every stage takes the [`Session`] explicitly and refuses to run until the
//! artifact it depends on is present.

pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod partition;
pub mod session;
pub mod simulate;
pub mod train;

pub use error::PipelineError;
pub use evaluation::{ConfusionMatrix, EvaluationMetrics};
pub use ingest::{ingest, load_table, DatasetSummary};
pub use partition::{partition, PartitionOutcome, SliceCounts, TimeWindow, WindowSet};
pub use session::{Dataset, Session, SharedSession};
pub use simulate::{ReplaySnapshot, SimulationEvent};
pub use train::train;

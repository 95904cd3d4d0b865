//! Fit on the training slice, score on the test slice.

use std::time::Instant;

use tracing::info;

use super::evaluation::{ConfusionMatrix, EvaluationMetrics};
use super::session::Session;
use super::PipelineError;
use crate::classifier::{BoosterParams, FittedModel, GradientBoostedClassifier};
use crate::features::encode_joint;

/// Train on the stored train slice and evaluate on the stored test slice.
/// The fitted model replaces whatever model the session held.
pub fn train(
    session: &mut Session,
    params: &BoosterParams,
) -> Result<EvaluationMetrics, PipelineError> {
    let (train, test) = session.require_train_and_test()?;
    if train.is_empty() {
        return Err(PipelineError::NotReady(
            "Training window contains no rows.".into(),
        ));
    }

    let started = Instant::now();
    let (schema, x_train, x_test) = encode_joint(&train, &test);
    debug_assert_eq!(x_train.columns, x_test.columns);

    let booster = GradientBoostedClassifier::fit(params.clone(), &x_train.rows, train.labels())
        .map_err(|e| PipelineError::Internal(format!("Model training failed: {e}")))?;

    let predicted = booster.predict_batch(&x_test.rows);
    let confusion = ConfusionMatrix::tally(test.labels(), &predicted);
    let metrics = EvaluationMetrics::from(&confusion);

    info!(
        train_rows = x_train.n_rows(),
        test_rows = x_test.n_rows(),
        features = schema.n_columns(),
        trees = booster.n_trees(),
        accuracy = metrics.accuracy,
        f1 = metrics.f1_score,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "model trained"
    );

    session.install_model(FittedModel::new(schema, booster));
    Ok(metrics)
}

//! Binary classification metrics.

use serde::Serialize;

/// Round to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn tally(actual: &[u8], predicted: &[u8]) -> Self {
        let mut m = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (1, 1) => m.true_positive += 1,
                (0, 1) => m.false_positive += 1,
                (1, _) => m.false_negative += 1,
                _ => m.true_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Zero when precision and recall are both zero.
    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }
}

/// Test-window scores as percentages rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1Score")]
    pub f1_score: f64,
}

impl From<&ConfusionMatrix> for EvaluationMetrics {
    fn from(m: &ConfusionMatrix) -> Self {
        Self {
            accuracy: round2(m.accuracy() * 100.0),
            precision: round2(m.precision() * 100.0),
            recall: round2(m.recall() * 100.0),
            f1_score: round2(m.f1() * 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_predictions() {
        let actual = [1, 1, 0, 0, 1, 0];
        let predicted = [1, 0, 1, 0, 1, 0];
        let m = ConfusionMatrix::tally(&actual, &predicted);
        assert_eq!(m.true_positive, 2);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.true_negative, 2);

        let metrics = EvaluationMetrics::from(&m);
        assert_eq!(metrics.accuracy, 66.67);
        assert_eq!(metrics.precision, 66.67);
        assert_eq!(metrics.recall, 66.67);
        assert_eq!(metrics.f1_score, 66.67);
    }

    #[test]
    fn test_no_positives_anywhere_is_zero_not_nan() {
        let m = ConfusionMatrix::tally(&[0, 0, 0], &[0, 0, 0]);
        let metrics = EvaluationMetrics::from(&m);
        assert_eq!(metrics.accuracy, 100.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
    }

    #[test]
    fn test_empty_test_window() {
        let metrics = EvaluationMetrics::from(&ConfusionMatrix::tally(&[], &[]));
        assert_eq!(
            metrics,
            EvaluationMetrics {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1_score: 0.0
            }
        );
    }

    #[test]
    fn test_serializes_f1_score_key() {
        let json = serde_json::to_value(EvaluationMetrics::from(&ConfusionMatrix::default()))
            .unwrap();
        assert!(json.get("f1Score").is_some());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(12.0), 12.0);
    }
}

//! Binary classification metrics
//!
//! One confusion matrix implementation shared by scoring, reporting, and
//! the serving layer, so every consumer observes identical prediction and
//! metric semantics. Positive class is label `1`.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix for a binary classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Tally truth against predictions
    ///
    /// Lengths must match; any label other than `1` counts as negative.
    pub fn from_labels(truth: &Array1<usize>, predictions: &Array1<usize>) -> Self {
        debug_assert_eq!(truth.len(), predictions.len());

        let mut matrix = Self {
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        };
        for (&t, &p) in truth.iter().zip(predictions.iter()) {
            match (t == 1, p == 1) {
                (true, true) => matrix.true_positives += 1,
                (false, true) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_negatives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_positives + self.true_negatives,
            self.total(),
        )
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// F1 score; zero when the model never predicts or hits the positive
    /// class
    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + self.false_positives + self.false_negatives,
        )
    }

    /// Counts in `[[tn, fp], [fn, tp]]` layout
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// F1 score of predictions against truth
pub fn f1_score(truth: &Array1<usize>, predictions: &Array1<usize>) -> f64 {
    ConfusionMatrix::from_labels(truth, predictions).f1()
}

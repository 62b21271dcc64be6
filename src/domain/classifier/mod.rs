//! Fitted classifier implementations.
//!
//! Trees and SVMs are delegated to [`linfa`]; the random forest bags `linfa-trees`
//! estimators and the boosted ensemble carries its own regression trees.

use ndarray::{Array1, Array2, Axis};

pub mod boosting;
pub mod decision_tree;
pub mod random_forest;
pub mod svm;

pub use boosting::GradientBoostingClassifier;
pub use decision_tree::DecisionTreeClassifier;
pub use random_forest::RandomForestClassifier;
pub use svm::{SvmClassifier, SvmKernel};

/// Shapes one sample as a 1×n matrix, the record layout linfa predicts on.
pub(crate) fn single_row(features: &[f64]) -> Array2<f64> {
    Array1::from_vec(features.to_vec()).insert_axis(Axis(0))
}

/// Index of the largest score; ties resolve to the lowest index.
pub(crate) fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate() {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[1.0, 1.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn single_row_has_one_record() {
        let row = single_row(&[1.0, 2.0, 3.0]);
        assert_eq!(row.dim(), (1, 3));
    }
}

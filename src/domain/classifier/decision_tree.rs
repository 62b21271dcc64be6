use crate::domain::classifier::single_row;
use crate::domain::model::Classifier;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Single CART tree with Gini splits.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: DecisionTree<f64, usize>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTreeClassifier {
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
        max_depth: usize,
    ) -> Result<Self, String> {
        let tree = fit_tree(records.clone(), targets.clone(), max_depth)?;
        Ok(Self {
            tree,
            n_features: records.ncols(),
            n_classes,
        })
    }
}

impl DecisionTreeClassifier {
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        match self.tree.features().into_iter().find(|&f| f >= self.n_features) {
            Some(bad) => Err(format!(
                "tree splits on feature {} but the model has {}",
                bad, self.n_features
            )),
            None => Ok(()),
        }
    }
}

pub(crate) fn fit_tree(
    records: Array2<f64>,
    targets: Array1<usize>,
    max_depth: usize,
) -> Result<DecisionTree<f64, usize>, String> {
    let dataset = DatasetBase::new(records, targets);
    DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(Some(max_depth))
        .fit(&dataset)
        .map_err(|e| e.to_string())
}

pub(crate) fn predict_tree(tree: &DecisionTree<f64, usize>, features: &[f64]) -> usize {
    let predicted: Array1<usize> = tree.predict(&single_row(features));
    predicted[0]
}

impl Classifier for DecisionTreeClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &[f64]) -> usize {
        predict_tree(&self.tree, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn separates_two_clusters() {
        let x = array![[0.0, 0.1], [0.2, 0.0], [0.1, 0.2], [5.0, 5.1], [5.2, 4.9], [4.8, 5.0]];
        let y = array![0usize, 0, 0, 1, 1, 1];
        let model = DecisionTreeClassifier::fit(&x, &y, 2, 3).unwrap();
        assert_eq!(model.predict(&[0.05, 0.05]), 0);
        assert_eq!(model.predict(&[5.0, 5.0]), 1);
        assert_eq!(model.n_features(), 2);
        assert!(model.predict_proba(&[0.0, 0.0]).is_none());
    }
}

//! Bagged decision trees.
//!
//! Each tree sees a bootstrap sample of the rows and a random subspace of
//! `ceil(sqrt(n_features))` columns. Prediction is a majority vote.

use crate::domain::classifier::argmax;
use crate::domain::classifier::decision_tree::{fit_tree, predict_tree};
use crate::domain::model::Classifier;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct SubspaceTree {
    feature_indices: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<SubspaceTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
        n_estimators: usize,
        max_depth: usize,
        seed: u64,
    ) -> Result<Self, String> {
        let n_rows = records.nrows();
        let n_features = records.ncols();
        if n_rows == 0 || n_features == 0 {
            return Err("random forest needs at least one row and one feature".to_string());
        }
        let subspace = ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut trees = Vec::with_capacity(n_estimators);
        for _ in 0..n_estimators {
            let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let mut feature_indices =
                rand::seq::index::sample(&mut rng, n_features, subspace).into_vec();
            feature_indices.sort_unstable();

            let x = records
                .select(Axis(0), &rows)
                .select(Axis(1), &feature_indices);
            let y = targets.select(Axis(0), &rows);
            let tree = fit_tree(x, y, max_depth)?;
            trees.push(SubspaceTree {
                feature_indices,
                tree,
            });
        }

        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    /// Verifies every member only reads columns the model was fitted on.
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        for (i, member) in self.trees.iter().enumerate() {
            if let Some(bad) = member.feature_indices.iter().find(|&&f| f >= self.n_features) {
                return Err(format!(
                    "tree {} reads feature {} but the model has {}",
                    i, bad, self.n_features
                ));
            }
            let width = member.feature_indices.len();
            if member.tree.features().into_iter().any(|f| f >= width) {
                return Err(format!("tree {} splits outside its {}-column subspace", i, width));
            }
        }
        Ok(())
    }

    fn votes(&self, features: &[f64]) -> Vec<f64> {
        let mut votes = vec![0.0; self.n_classes];
        let mut projected = Vec::with_capacity(self.n_features);
        for member in &self.trees {
            projected.clear();
            projected.extend(member.feature_indices.iter().map(|&i| features[i]));
            let label = predict_tree(&member.tree, &projected);
            if let Some(v) = votes.get_mut(label) {
                *v += 1.0;
            }
        }
        votes
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.votes(features))
    }

    fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        let votes = self.votes(features);
        let total: f64 = votes.iter().sum();
        if total == 0.0 {
            return None;
        }
        Some(votes.into_iter().map(|v| v / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [0.0, 0.1, 0.0],
            [0.2, 0.0, 0.1],
            [0.1, 0.2, 0.2],
            [0.0, 0.0, 0.1],
            [5.0, 5.1, 5.0],
            [5.2, 4.9, 5.1],
            [4.8, 5.0, 4.9],
            [5.1, 5.0, 5.2]
        ];
        let y = array![0usize, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn votes_form_a_distribution() {
        let (x, y) = blobs();
        let model = RandomForestClassifier::fit(&x, &y, 2, 15, 3, 7).unwrap();
        assert_eq!(model.predict(&[0.1, 0.1, 0.1]), 0);
        assert_eq!(model.predict(&[5.0, 5.0, 5.0]), 1);
        let proba = model.predict_proba(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = blobs();
        let a = RandomForestClassifier::fit(&x, &y, 2, 10, 3, 42).unwrap();
        let b = RandomForestClassifier::fit(&x, &y, 2, 10, 3, 42).unwrap();
        let sa: Vec<_> = a.trees.iter().map(|t| t.feature_indices.clone()).collect();
        let sb: Vec<_> = b.trees.iter().map(|t| t.feature_indices.clone()).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn structure_check_catches_bad_feature_indices() {
        let (x, y) = blobs();
        let mut model = RandomForestClassifier::fit(&x, &y, 2, 5, 3, 3).unwrap();
        model.check_structure().unwrap();
        model.trees[0].feature_indices[0] = 9;
        assert!(model.check_structure().is_err());
    }

    #[test]
    fn rejects_empty_input() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<usize>::zeros(0);
        assert!(RandomForestClassifier::fit(&x, &y, 2, 10, 3, 1).is_err());
    }
}

//! Gradient-boosted trees with a softmax objective.
//!
//! Each boosting round fits one regression tree per class on the first and
//! second order gradients of the multiclass log loss, the same scheme as
//! XGBoost's `multi:softprob` with exact greedy splits.

use crate::domain::classifier::argmax;
use crate::domain::model::Classifier;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_DEPTH: usize = 6;
const DEFAULT_LAMBDA: f64 = 1.0;
const DEFAULT_MIN_CHILD_WEIGHT: f64 = 1.0;
const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Children are always stored after their parent, which keeps traversal finite.
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("regression tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but the model has {}",
                        id, feature, n_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(format!("node {} points at invalid child {}", id, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Tree-growing settings shared by every round.
#[derive(Debug, Clone, Copy)]
struct GrowParams {
    max_depth: usize,
    lambda: f64,
    min_child_weight: f64,
    learning_rate: f64,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    records: &'a Array2<f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    params: GrowParams,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self) -> RegressionTree {
        let rows: Vec<usize> = (0..self.records.nrows()).collect();
        self.grow(&rows, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]))
    }

    fn leaf_weight(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.lambda) * self.params.learning_rate
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn grow(&mut self, rows: &[usize], depth: usize) -> usize {
        let (g, h) = self.sums(rows);
        let id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: self.leaf_weight(g, h),
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return id;
        }
        let Some(best) = self.best_split(rows, g, h) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.records[[r, best.feature]] < best.threshold);
        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes[id] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent = self.score(g, h);
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.records.ncols() {
            let column: ArrayView1<f64> = self.records.column(feature);
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let (mut gl, mut hl) = (0.0, 0.0);
            for pair in sorted.windows(2) {
                let (cur, next) = (pair[0], pair[1]);
                gl += self.grad[cur];
                hl += self.hess[cur];
                if column[cur] == column[next] {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }
                let gain = 0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent);
                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (column[cur] + column[next]) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    /// `rounds[r][k]` is the tree for class `k` in round `r`.
    rounds: Vec<Vec<RegressionTree>>,
    learning_rate: f64,
    max_depth: usize,
    n_features: usize,
    n_classes: usize,
}

impl GradientBoostingClassifier {
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
        n_estimators: usize,
        learning_rate: f64,
    ) -> Result<Self, String> {
        let n_rows = records.nrows();
        if n_rows == 0 {
            return Err("gradient boosting needs at least one row".to_string());
        }
        if n_classes < 2 {
            return Err("gradient boosting needs at least two classes".to_string());
        }
        if let Some(bad) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(format!("target {} outside 0..{}", bad, n_classes));
        }

        let params = GrowParams {
            max_depth: DEFAULT_MAX_DEPTH,
            lambda: DEFAULT_LAMBDA,
            min_child_weight: DEFAULT_MIN_CHILD_WEIGHT,
            learning_rate,
        };

        let samples: Vec<Vec<f64>> = records.outer_iter().map(|r| r.to_vec()).collect();
        let mut raw = vec![vec![0.0; n_classes]; n_rows];
        let mut rounds = Vec::with_capacity(n_estimators);
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];

        for _ in 0..n_estimators {
            let probs: Vec<Vec<f64>> = raw.iter().map(|r| softmax(r)).collect();
            let mut round = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                for row in 0..n_rows {
                    let p = probs[row][class];
                    let y = if targets[row] == class { 1.0 } else { 0.0 };
                    grad[row] = p - y;
                    hess[row] = (p * (1.0 - p)).max(MIN_HESSIAN);
                }
                let tree = TreeBuilder {
                    records,
                    grad: &grad,
                    hess: &hess,
                    params,
                    nodes: Vec::new(),
                }
                .build();
                for (scores, sample) in raw.iter_mut().zip(&samples) {
                    scores[class] += tree.predict(sample);
                }
                round.push(tree);
            }
            rounds.push(round);
        }

        Ok(Self {
            rounds,
            learning_rate,
            max_depth: params.max_depth,
            n_features: records.ncols(),
            n_classes,
        })
    }

    fn raw_scores(&self, features: &[f64]) -> Vec<f64> {
        let mut scores = vec![0.0; self.n_classes];
        for round in &self.rounds {
            for (class, tree) in round.iter().enumerate() {
                scores[class] += tree.predict(features);
            }
        }
        scores
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Verifies a deserialized model can be evaluated without indexing out of bounds.
    pub(crate) fn check_structure(&self) -> Result<(), String> {
        for (r, round) in self.rounds.iter().enumerate() {
            if round.len() != self.n_classes {
                return Err(format!(
                    "round {} has {} trees, expected {}",
                    r,
                    round.len(),
                    self.n_classes
                ));
            }
            for tree in round {
                tree.check(self.n_features)?;
            }
        }
        Ok(())
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for GradientBoostingClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.raw_scores(features))
    }

    fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        Some(softmax(&self.raw_scores(features)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
        let uniform = softmax(&[0.0, 0.0]);
        assert_eq!(uniform, vec![0.5, 0.5]);
    }

    #[test]
    fn learns_a_threshold() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [10.0], [11.0], [12.0], [13.0]];
        let y = array![0usize, 0, 0, 0, 1, 1, 1, 1];
        let model = GradientBoostingClassifier::fit(&x, &y, 2, 20, 0.3).unwrap();
        assert_eq!(model.n_rounds(), 20);
        assert_eq!(model.predict(&[1.5]), 0);
        assert_eq!(model.predict(&[11.5]), 1);
        let proba = model.predict_proba(&[11.5]).unwrap();
        assert!(proba[1] > 0.5);
    }

    #[test]
    fn structure_check_catches_bad_indices() {
        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = array![0usize, 0, 1, 1];
        let mut model = GradientBoostingClassifier::fit(&x, &y, 2, 3, 0.3).unwrap();
        model.check_structure().unwrap();

        model.rounds[0][0] = RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 4,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 0.0 },
                TreeNode::Leaf { value: 1.0 },
            ],
        };
        assert!(model.check_structure().is_err());

        model.rounds[0][0] = RegressionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 0,
            }],
        };
        assert!(model.check_structure().is_err());
    }

    #[test]
    fn rejects_out_of_range_targets() {
        let x = array![[0.0], [1.0]];
        let y = array![0usize, 3];
        assert!(GradientBoostingClassifier::fit(&x, &y, 2, 5, 0.1).is_err());
    }
}

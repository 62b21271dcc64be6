//! One-vs-all support vector machines from `linfa-svm`.

use crate::domain::classifier::{argmax, single_row};
use crate::domain::model::Classifier;
use linfa::prelude::Pr;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Polynomial kernel degree, matching scikit-learn's default.
const POLY_DEGREE: f64 = 3.0;
const POLY_CONSTANT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SvmKernel {
    #[default]
    Linear,
    Rbf,
    Poly,
}

impl fmt::Display for SvmKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvmKernel::Linear => f.write_str("linear"),
            SvmKernel::Rbf => f.write_str("rbf"),
            SvmKernel::Poly => f.write_str("poly"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SvmClassifier {
    machines: Vec<(usize, Svm<f64, Pr>)>,
    kernel: SvmKernel,
    n_features: usize,
    n_classes: usize,
}

impl SvmClassifier {
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
        c: f64,
        kernel: SvmKernel,
    ) -> Result<Self, String> {
        let dataset = DatasetBase::new(records.clone(), targets.clone());
        let base = Svm::<f64, Pr>::params().pos_neg_weights(c, c);
        let params = match kernel {
            SvmKernel::Linear => base.linear_kernel(),
            SvmKernel::Rbf => base.gaussian_kernel(gaussian_width(records)),
            SvmKernel::Poly => base.polynomial_kernel(POLY_CONSTANT, POLY_DEGREE),
        };

        let mut machines = Vec::with_capacity(n_classes);
        for (label, binary) in dataset.one_vs_all().map_err(|e| e.to_string())? {
            let svm = params.fit(&binary).map_err(|e| e.to_string())?;
            machines.push((label, svm));
        }
        machines.sort_by_key(|(label, _)| *label);

        Ok(Self {
            machines,
            kernel,
            n_features: records.ncols(),
            n_classes,
        })
    }

    pub(crate) fn check_structure(&self) -> Result<(), String> {
        match self.machines.iter().find(|(label, _)| *label >= self.n_classes) {
            Some((label, _)) => Err(format!(
                "machine for label {} but the model has {} classes",
                label, self.n_classes
            )),
            None => Ok(()),
        }
    }

    fn scores(&self, features: &[f64]) -> Vec<f64> {
        let row = single_row(features);
        let mut scores = vec![0.0; self.n_classes];
        for (label, svm) in &self.machines {
            let pr: Array1<Pr> = svm.predict(&row);
            if let Some(s) = scores.get_mut(*label) {
                *s = f64::from(*pr[0]);
            }
        }
        scores
    }
}

/// Kernel width equivalent to scikit-learn's `gamma="scale"`: `n_features * var(X)`.
fn gaussian_width(records: &Array2<f64>) -> f64 {
    let variance = records.var(0.0);
    let width = records.ncols() as f64 * variance;
    if width.is_finite() && width > 0.0 {
        width
    } else {
        1.0
    }
}

impl Classifier for SvmClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.scores(features))
    }

    fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        let scores = self.scores(features);
        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            Some(scores.into_iter().map(|s| s / total).collect())
        } else {
            let n = self.n_classes.max(1) as f64;
            Some(vec![1.0 / n; self.n_classes])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn gaussian_width_falls_back_on_constant_data() {
        let x = array![[1.0, 1.0], [1.0, 1.0]];
        assert_eq!(gaussian_width(&x), 1.0);
        let y = array![[0.0, 2.0], [2.0, 0.0]];
        assert!((gaussian_width(&y) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn three_class_linear_svm() {
        let x = array![
            [0.0, 0.0],
            [0.3, 0.1],
            [0.1, 0.3],
            [5.0, 0.0],
            [5.3, 0.2],
            [4.8, 0.1],
            [0.0, 5.0],
            [0.2, 5.2],
            [0.1, 4.8]
        ];
        let y = array![0usize, 0, 0, 1, 1, 1, 2, 2, 2];
        let model = SvmClassifier::fit(&x, &y, 3, 1.0, SvmKernel::Linear).unwrap();
        assert_eq!(model.predict(&[0.1, 0.1]), 0);
        assert_eq!(model.predict(&[5.1, 0.1]), 1);
        assert_eq!(model.predict(&[0.1, 5.1]), 2);
        let proba = model.predict_proba(&[5.1, 0.1]).unwrap();
        assert_eq!(proba.len(), 3);
    }
}

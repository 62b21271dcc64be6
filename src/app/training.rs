//! Offline training: fit one classifier, evaluate it, write artifact and report.

use crate::domain::classifier::{
    DecisionTreeClassifier, GradientBoostingClassifier, RandomForestClassifier, SvmClassifier,
    SvmKernel,
};
use crate::domain::dataset::{train_test_split, TabularDataset};
use crate::domain::error::TrainingError;
use crate::domain::metrics::EvaluationReport;
use crate::domain::model::{metrics_file_name, FittedClassifier, ModelArtifact, ModelName};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

const N_ESTIMATORS_RANGE: RangeInclusive<usize> = 10..=500;
const MAX_DEPTH_RANGE: RangeInclusive<usize> = 1..=20;
const C_RANGE: RangeInclusive<f64> = 0.01..=10.0;
const LEARNING_RATE_RANGE: RangeInclusive<f64> = 0.01..=0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub c: f64,
    pub kernel: SvmKernel,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: SvmKernel::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeParams {
    pub max_depth: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XgboostParams {
    pub learning_rate: f64,
    pub n_estimators: usize,
}

impl Default for XgboostParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            n_estimators: 100,
        }
    }
}

/// Algorithm choice together with its hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum TrainingAlgorithm {
    RandomForest(RandomForestParams),
    Svm(SvmParams),
    DecisionTree(DecisionTreeParams),
    Xgboost(XgboostParams),
}

impl TrainingAlgorithm {
    pub fn model_name(&self) -> ModelName {
        match self {
            TrainingAlgorithm::RandomForest(_) => ModelName::RandomForest,
            TrainingAlgorithm::Svm(_) => ModelName::Svm,
            TrainingAlgorithm::DecisionTree(_) => ModelName::DecisionTree,
            TrainingAlgorithm::Xgboost(_) => ModelName::Xgboost,
        }
    }

    /// Default hyperparameters for `model`.
    pub fn with_defaults(model: ModelName) -> Self {
        match model {
            ModelName::RandomForest => TrainingAlgorithm::RandomForest(Default::default()),
            ModelName::Svm => TrainingAlgorithm::Svm(Default::default()),
            ModelName::DecisionTree => TrainingAlgorithm::DecisionTree(Default::default()),
            ModelName::Xgboost => TrainingAlgorithm::Xgboost(Default::default()),
        }
    }

    pub fn validate(&self) -> Result<(), TrainingError> {
        match self {
            TrainingAlgorithm::RandomForest(p) => {
                check_range("n_estimators", p.n_estimators, &N_ESTIMATORS_RANGE)?;
                check_range("max_depth", p.max_depth, &MAX_DEPTH_RANGE)
            }
            TrainingAlgorithm::Svm(p) => check_range("C", p.c, &C_RANGE),
            TrainingAlgorithm::DecisionTree(p) => {
                check_range("max_depth", p.max_depth, &MAX_DEPTH_RANGE)
            }
            TrainingAlgorithm::Xgboost(p) => {
                check_range("learning_rate", p.learning_rate, &LEARNING_RATE_RANGE)?;
                check_range("n_estimators", p.n_estimators, &N_ESTIMATORS_RANGE)
            }
        }
    }
}

fn check_range<T>(
    name: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), TrainingError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(TrainingError::InvalidHyperparameter {
            name,
            message: format!(
                "{} is outside [{}, {}]",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}

/// Everything needed to produce one artifact.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub target_column: String,
    pub feature_columns: Vec<String>,
    pub algorithm: TrainingAlgorithm,
    pub test_size: f64,
    pub seed: u64,
}

impl TrainingJob {
    pub fn new(
        target_column: impl Into<String>,
        feature_columns: Vec<String>,
        algorithm: TrainingAlgorithm,
    ) -> Self {
        Self {
            target_column: target_column.into(),
            feature_columns,
            algorithm,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
}

#[derive(Debug)]
pub struct SavedTraining {
    pub artifact_path: PathBuf,
    pub report_path: PathBuf,
    pub report: EvaluationReport,
}

/// Fits and evaluates the job's classifier without touching the filesystem.
pub fn train(
    dataset: &TabularDataset,
    job: &TrainingJob,
) -> Result<TrainingOutcome, TrainingError> {
    job.algorithm.validate()?;
    if !(job.test_size > 0.0 && job.test_size < 1.0) {
        return Err(TrainingError::InvalidHyperparameter {
            name: "test_size",
            message: format!("{} is outside (0, 1)", job.test_size),
        });
    }

    let data = dataset.select(&job.target_column, &job.feature_columns)?;
    let n_classes = data.classes.len();
    let split = train_test_split(&data.records, &data.targets, job.test_size, job.seed);
    if split.train_records.nrows() == 0 {
        return Err(TrainingError::Dataset("training split is empty".to_string()));
    }

    let model = job.algorithm.model_name();
    tracing::info!(
        %model,
        train_rows = split.train_records.nrows(),
        test_rows = split.test_records.nrows(),
        n_classes,
        "fitting classifier"
    );

    let (x, y) = (&split.train_records, &split.train_targets);
    let fit_error = |message: String| TrainingError::Fit { model, message };
    let classifier = match job.algorithm {
        TrainingAlgorithm::RandomForest(p) => FittedClassifier::RandomForest(
            RandomForestClassifier::fit(x, y, n_classes, p.n_estimators, p.max_depth, job.seed)
                .map_err(fit_error)?,
        ),
        TrainingAlgorithm::Svm(p) => FittedClassifier::Svm(
            SvmClassifier::fit(x, y, n_classes, p.c, p.kernel).map_err(fit_error)?,
        ),
        TrainingAlgorithm::DecisionTree(p) => FittedClassifier::DecisionTree(
            DecisionTreeClassifier::fit(x, y, n_classes, p.max_depth).map_err(fit_error)?,
        ),
        TrainingAlgorithm::Xgboost(p) => FittedClassifier::Xgboost(
            GradientBoostingClassifier::fit(x, y, n_classes, p.n_estimators, p.learning_rate)
                .map_err(fit_error)?,
        ),
    };

    let predicted: Vec<usize> = {
        let fitted = classifier.as_classifier();
        split
            .test_records
            .outer_iter()
            .map(|row| fitted.predict(&row.to_vec()))
            .collect()
    };
    let report = EvaluationReport::compute(
        model,
        &data.classes,
        &split.test_targets.to_vec(),
        &predicted,
        split.train_records.nrows(),
    );
    tracing::info!(%model, accuracy = report.accuracy, "evaluated on held-out split");

    Ok(TrainingOutcome {
        artifact: ModelArtifact::new(classifier, data.feature_names, data.classes),
        report,
    })
}

/// Trains and writes `<model>_model.json` and `<model>_metrics.json` into `models_dir`.
pub fn train_and_save(
    dataset: &TabularDataset,
    job: &TrainingJob,
    models_dir: &Path,
) -> Result<SavedTraining, TrainingError> {
    let outcome = train(dataset, job)?;
    let artifact_path = outcome.artifact.save(models_dir)?;
    let report_path = models_dir.join(metrics_file_name(outcome.artifact.model_name()));
    outcome.report.save(&report_path)?;
    tracing::info!(artifact = %artifact_path.display(), "model artifact written");

    Ok(SavedTraining {
        artifact_path,
        report_path,
        report: outcome.report,
    })
}

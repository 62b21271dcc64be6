//! Offline trainer: fits one classifier from a CSV and writes its artifact and report.

use clap::{Args, Parser, Subcommand};
use iris_serving::app::training::{
    train_and_save, DecisionTreeParams, RandomForestParams, SvmParams, TrainingAlgorithm,
    TrainingJob, XgboostParams, DEFAULT_SEED, DEFAULT_TEST_SIZE,
};
use iris_serving::domain::classifier::SvmKernel;
use iris_serving::domain::dataset::TabularDataset;
use iris_serving::domain::metrics::EvaluationReport;
use iris_serving::infra::logging::{init_logging, LoggingConfig};
use iris_serving::ModelName;
use std::path::PathBuf;

/// Train an Iris classifier and write `<model>_model.json` + `<model>_metrics.json`
#[derive(Parser)]
#[command(name = "train")]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file with a header row
    #[arg(long, default_value = "data/Iris.csv", global = true)]
    dataset: PathBuf,

    /// Column holding the class label
    #[arg(long, default_value = "Species", global = true)]
    target: String,

    /// Comma-separated feature columns, in the order requests will send them
    #[arg(
        long,
        value_delimiter = ',',
        global = true,
        default_value = "SepalLengthCm,SepalWidthCm,PetalLengthCm,PetalWidthCm"
    )]
    features: Vec<String>,

    /// Output directory for artifacts
    #[arg(long, env = "MODELS_DIR", default_value = "models", global = true)]
    models_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_SEED, global = true)]
    seed: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE, global = true)]
    test_size: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bagged decision trees
    RandomForest(ForestArgs),

    /// Support vector machine (one-vs-all)
    Svm(SvmArgs),

    /// Single CART decision tree
    DecisionTree(TreeArgs),

    /// Gradient-boosted trees with a softmax objective
    Xgboost(BoostArgs),

    /// Train every model with default hyperparameters
    All,
}

#[derive(Args)]
struct ForestArgs {
    #[arg(long, default_value_t = 100)]
    n_estimators: usize,
    #[arg(long, default_value_t = 5)]
    max_depth: usize,
}

#[derive(Args)]
struct SvmArgs {
    /// Regularization strength
    #[arg(long = "c", default_value_t = 1.0)]
    c: f64,
    #[arg(long, value_enum, default_value_t = SvmKernel::Linear)]
    kernel: SvmKernel,
}

#[derive(Args)]
struct TreeArgs {
    #[arg(long, default_value_t = 5)]
    max_depth: usize,
}

#[derive(Args)]
struct BoostArgs {
    #[arg(long, default_value_t = 0.1)]
    learning_rate: f64,
    #[arg(long, default_value_t = 100)]
    n_estimators: usize,
}

impl Command {
    fn algorithms(&self) -> Vec<TrainingAlgorithm> {
        match self {
            Command::RandomForest(a) => vec![TrainingAlgorithm::RandomForest(RandomForestParams {
                n_estimators: a.n_estimators,
                max_depth: a.max_depth,
            })],
            Command::Svm(a) => vec![TrainingAlgorithm::Svm(SvmParams {
                c: a.c,
                kernel: a.kernel,
            })],
            Command::DecisionTree(a) => vec![TrainingAlgorithm::DecisionTree(DecisionTreeParams {
                max_depth: a.max_depth,
            })],
            Command::Xgboost(a) => vec![TrainingAlgorithm::Xgboost(XgboostParams {
                learning_rate: a.learning_rate,
                n_estimators: a.n_estimators,
            })],
            Command::All => ModelName::ALL
                .into_iter()
                .map(TrainingAlgorithm::with_defaults)
                .collect(),
        }
    }
}

fn print_report(report: &EvaluationReport) {
    println!(
        "> {}: accuracy {:.4} on {} held-out rows ({} train)",
        report.model, report.accuracy, report.test_size, report.train_size
    );
    println!("  confusion matrix (rows = actual):");
    for row in &report.confusion_matrix {
        let cells: Vec<String> = row.iter().map(|c| format!("{:>4}", c)).collect();
        println!("  {}", cells.join(""));
    }
    println!("  {:<18} {:>9} {:>9} {:>9} {:>8}", "class", "precision", "recall", "f1", "support");
    for class in &report.per_class {
        println!(
            "  {:<18} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            class.label, class.precision, class.recall, class.f1_score, class.support
        );
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env()?);

    let dataset = TabularDataset::from_path(&cli.dataset)?;
    tracing::info!(path = %cli.dataset.display(), rows = dataset.len(), "dataset loaded");

    for algorithm in cli.command.algorithms() {
        let mut job = TrainingJob::new(cli.target.clone(), cli.features.clone(), algorithm);
        job.seed = cli.seed;
        job.test_size = cli.test_size;

        let saved = train_and_save(&dataset, &job, &cli.models_dir)?;
        print_report(&saved.report);
        println!("  artifact: {}", saved.artifact_path.display());
        println!("  report:   {}", saved.report_path.display());
    }
    Ok(())
}

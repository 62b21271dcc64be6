#![allow(dead_code)]

use async_trait::async_trait;
use iris_serving::app::training::{
    train_and_save, DecisionTreeParams, RandomForestParams, SvmParams, TrainingAlgorithm,
    TrainingJob, XgboostParams,
};
use iris_serving::domain::classifier::SvmKernel;
use iris_serving::domain::dataset::TabularDataset;
use iris_serving::domain::prediction::PredictionRecord;
use iris_serving::storage::StoreError;
use iris_serving::{transport, ModelName, ModelRegistry, PredictionService, PredictionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SETOSA: [f64; 4] = [5.1, 3.5, 1.4, 0.2];
pub const VERSICOLOR: [f64; 4] = [6.4, 3.2, 4.5, 1.5];
pub const VIRGINICA: [f64; 4] = [6.7, 3.0, 5.2, 2.3];

pub fn dataset_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/Iris.csv")
}

pub fn iris() -> TabularDataset {
    TabularDataset::from_path(&dataset_path()).expect("bundled Iris.csv should parse")
}

pub fn feature_columns() -> Vec<String> {
    ["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Small but in-range hyperparameters so fixtures train quickly.
pub fn quick_algorithm(model: ModelName) -> TrainingAlgorithm {
    match model {
        ModelName::RandomForest => TrainingAlgorithm::RandomForest(RandomForestParams {
            n_estimators: 25,
            max_depth: 5,
        }),
        ModelName::Svm => TrainingAlgorithm::Svm(SvmParams {
            c: 1.0,
            kernel: SvmKernel::Rbf,
        }),
        ModelName::DecisionTree => {
            TrainingAlgorithm::DecisionTree(DecisionTreeParams { max_depth: 5 })
        }
        ModelName::Xgboost => TrainingAlgorithm::Xgboost(XgboostParams {
            learning_rate: 0.3,
            n_estimators: 20,
        }),
    }
}

pub fn train_fixture_models(dir: &Path, models: &[ModelName]) {
    let dataset = iris();
    for model in models {
        let job = TrainingJob::new("Species", feature_columns(), quick_algorithm(*model));
        train_and_save(&dataset, &job, dir).expect("fixture training should succeed");
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_server(registry: ModelRegistry, store: Arc<dyn PredictionStore>) -> TestServer {
    let state = transport::http::AppState::new(PredictionService::new(Arc::new(registry), store));
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client"),
        handle,
    }
}

/// A store whose backend is always down.
pub struct FailingStore;

#[async_trait]
impl PredictionStore for FailingStore {
    async fn append(&self, _record: &PredictionRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn list(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn clear(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

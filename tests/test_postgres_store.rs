//! Runs only when DATABASE_URL points at a reachable PostgreSQL instance.
//! The test clears the `predictions` table.

use iris_serving::domain::prediction::{ClassLabel, FeatureVector, PredictionRecord};
use iris_serving::{ModelName, PostgresPredictionStore, PredictionStore};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_postgres_store_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
        return Ok(());
    };

    let store = PostgresPredictionStore::connect_lazy(&url)?;
    store.ping().await?;
    store.ensure_schema().await?;
    store.clear().await?;

    let records = vec![
        PredictionRecord::new(
            FeatureVector::new([5.1, 3.5, 1.4, 0.2]),
            ClassLabel::IrisSetosa,
            ModelName::RandomForest,
        ),
        PredictionRecord::new(
            FeatureVector::new([6.4, 3.2, 4.5, 1.5]),
            ClassLabel::IrisVersicolor,
            ModelName::Svm,
        ),
        PredictionRecord::new(
            FeatureVector::new([6.7, 3.0, 5.2, 2.3]),
            ClassLabel::IrisVirginica,
            ModelName::Xgboost,
        ),
    ];
    for record in &records {
        store.append(record).await?;
    }

    assert_eq!(store.list().await?, records);
    assert_eq!(store.clear().await?, 3);
    assert!(store.list().await?.is_empty());
    assert_eq!(store.clear().await?, 0);
    Ok(())
}

use crate::domain::prediction::PredictionRecord;
use crate::storage::{PredictionStore, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryPredictionStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionStore for InMemoryPredictionStore {
    async fn append(&self, record: &PredictionRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! Append-only prediction history.

use crate::domain::prediction::PredictionRecord;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPredictionStore;
pub use postgres::PostgresPredictionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Persistence backend for prediction records.
///
/// Records are only ever appended, listed in insertion order, or deleted all at once.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn append(&self, record: &PredictionRecord) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<PredictionRecord>, StoreError>;

    /// Deletes every record and returns how many were removed.
    async fn clear(&self) -> Result<u64, StoreError>;

    /// Cheap reachability check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

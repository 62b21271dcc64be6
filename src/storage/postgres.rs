//! Persistent prediction store implementation using PostgreSQL.

use crate::domain::model::{ModelName, UnknownModelName};
use crate::domain::prediction::{FeatureVector, PredictionRecord};
use crate::storage::{PredictionStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tokio::sync::OnceCell;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS predictions (
    id BIGSERIAL PRIMARY KEY,
    features DOUBLE PRECISION[] NOT NULL,
    prediction SMALLINT NOT NULL,
    model TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// A prediction store backed by a PostgreSQL connection pool.
///
/// The pool connects lazily and the table is created on first use, so the
/// service starts even while the database is down.
pub struct PostgresPredictionStore {
    pool: PgPool,
    schema_ready: OnceCell<()>,
}

impl PostgresPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: OnceCell::new(),
        }
    }

    pub fn connect_lazy(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool))
    }

    /// Creates the `predictions` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PredictionStore for PostgresPredictionStore {
    async fn append(&self, record: &PredictionRecord) -> Result<(), StoreError> {
        self.ensure_schema().await?;
        sqlx::query("INSERT INTO predictions (features, prediction, model) VALUES ($1, $2, $3)")
            .bind(record.features.as_slice())
            .bind(i16::from(record.prediction))
            .bind(record.model.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        self.ensure_schema().await?;
        let rows =
            sqlx::query("SELECT features, prediction, model FROM predictions ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let features: Vec<f64> = row.try_get("features")?;
            let prediction: i16 = row.try_get("prediction")?;
            let model: String = row.try_get("model")?;

            let features = FeatureVector::try_from(features)
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            let prediction = u8::try_from(prediction)
                .map_err(|_| StoreError::Decode(format!("invalid label {}", prediction)))?;
            let model: ModelName = model
                .parse()
                .map_err(|e: UnknownModelName| StoreError::Decode(e.to_string()))?;

            records.push(PredictionRecord {
                features,
                prediction,
                model,
            });
        }
        Ok(records)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        self.ensure_schema().await?;
        let result = sqlx::query("DELETE FROM predictions")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// src/bin/api_server.rs

use anyhow::Context;
use iris_serving::infra::config::ServiceConfig;
use iris_serving::infra::logging::{init_logging, LoggingConfig};
use iris_serving::transport;
use iris_serving::{
    InMemoryPredictionStore, ModelRegistry, PostgresPredictionStore, PredictionService,
    PredictionStore,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = ServiceConfig::from_env()?;
    init_logging(&LoggingConfig {
        level: config.log_level.clone(),
        format: config.log_format,
    });

    // --- Model Registry Initialization ---
    tracing::info!(dir = %config.models_dir.display(), "loading model artifacts");
    let (registry, failures) = ModelRegistry::load_from_dir(&config.models_dir);
    let loaded = registry.list_models();
    if loaded.is_empty() {
        tracing::warn!(
            "no model artifacts loaded; every /predict call will be rejected until models are trained"
        );
    } else {
        tracing::info!(
            loaded = ?loaded.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            failed = failures.len(),
            "model registry ready"
        );
    }

    // --- Prediction Store Initialization ---
    let store: Arc<dyn PredictionStore> = match &config.database_url {
        Some(url) => {
            let pg = PostgresPredictionStore::connect_lazy(url)
                .context("DATABASE_URL is not a valid connection string")?;
            if let Err(e) = pg.ensure_schema().await {
                tracing::warn!(
                    error = %e,
                    "prediction store unreachable at startup; serving anyway"
                );
            }
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; predictions are kept in memory only");
            Arc::new(InMemoryPredictionStore::new())
        }
    };

    let service = PredictionService::new(Arc::new(registry), store);
    let app_state = transport::http::AppState::new(service);

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "API server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
            }
        })
        .await?;

    tracing::info!("graceful shutdown complete");
    Ok(())
}

//! Checks that the service would start healthy: artifacts load and the store answers.

use iris_serving::domain::model::artifact_file_name;
use iris_serving::infra::config;
use iris_serving::infra::logging::{init_logging, LoggingConfig};
use iris_serving::{ModelName, ModelRegistry, PostgresPredictionStore, PredictionStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--require-all]\n\
         \n\
         Reads env vars:\n\
           MODELS_DIR (default: models), DATABASE_URL (optional)\n\
         \n\
         --require-all   fail unless every model artifact loads\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let require_all = args.iter().any(|a| a == "--require-all");
    init_logging(&LoggingConfig::from_env()?);

    let models_dir = config::models_dir();
    println!("> Preflight:");
    println!("  MODELS_DIR={}", models_dir.display());

    let (registry, failures) = ModelRegistry::load_from_dir(&models_dir);
    for model in ModelName::ALL {
        let file = artifact_file_name(model);
        match failures.iter().find(|f| f.model == model) {
            None if registry.is_loaded(model) => {
                let report = registry
                    .evaluation(model)
                    .map(|r| format!(" (held-out accuracy {:.3})", r.accuracy))
                    .unwrap_or_default();
                println!("  [ok]   {}{}", file, report);
            }
            Some(failure) => println!("  [fail] {}: {}", file, failure.error),
            None => println!("  [fail] {}: not loaded", file),
        }
    }

    match config::database_url() {
        Some(url) => {
            let store = PostgresPredictionStore::connect_lazy(&url)?;
            store
                .ping()
                .await
                .map_err(|e| anyhow::anyhow!("Prediction store unreachable: {}", e))?;
            store
                .ensure_schema()
                .await
                .map_err(|e| anyhow::anyhow!("Could not create predictions table: {}", e))?;
            println!("  Prediction store reachable, `predictions` table present.");
        }
        None => println!("  DATABASE_URL not set; the server will keep predictions in memory."),
    }

    let loaded = registry.list_models().len();
    if loaded == 0 {
        anyhow::bail!("No model artifacts could be loaded from {}", models_dir.display());
    }
    if require_all && loaded < ModelName::ALL.len() {
        anyhow::bail!("{} of {} models loaded", loaded, ModelName::ALL.len());
    }

    println!("> Preflight OK ({} of {} models loaded).", loaded, ModelName::ALL.len());
    Ok(())
}

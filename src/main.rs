use clap::Parser;
use fairway_etl::utils::{logger, validation::Validate};
use fairway_etl::{CliConfig, CsvImportPipeline, LocalStorage, MigrationEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting fairway-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if config.api_key.is_none() {
        config.api_key = std::env::var("FAIRWAY_API_KEY").ok();
    }
    if config.api_key.is_none() && !config.dry_run {
        tracing::warn!("No API key supplied; inserts will be sent unauthenticated");
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.input_path.clone(), config.output_path.clone());
    let pipeline = CsvImportPipeline::new(storage, config);
    let engine = MigrationEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Migration completed: {}", summary);
            println!("✅ Migration completed: {}", summary);
        }
        Err(e) => {
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                fairway_etl::utils::error::ErrorSeverity::Low => 0,
                fairway_etl::utils::error::ErrorSeverity::Medium => 2,
                fairway_etl::utils::error::ErrorSeverity::High => 1,
                fairway_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

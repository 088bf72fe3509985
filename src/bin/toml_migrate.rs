use clap::Parser;
use fairway_etl::utils::logger;
use fairway_etl::{CsvImportPipeline, LocalStorage, MigrationConfig, MigrationEngine};

#[derive(Debug, Parser)]
#[command(name = "toml_migrate")]
#[command(about = "Runs a migration described by a TOML config file")]
struct Args {
    /// Path to the migration config file.
    #[arg(long, default_value = "migration.toml")]
    config: String,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let config = match MigrationConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load {}: {}", args.config, e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    tracing::info!("Loaded migration config: {}", config.migration.name);

    if let Err(e) = config.validate_config() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(
        config.source.input_path.clone(),
        config.load.output_path.clone(),
    );
    let pipeline = CsvImportPipeline::new(storage, config);

    match MigrationEngine::new(pipeline).run().await {
        Ok(summary) => {
            println!("✅ Migration completed: {}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Migration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }
}

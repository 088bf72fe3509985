pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{MigrationError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fairway-etl")]
#[command(about = "Moves course data exports between hosted database instances")]
pub struct CliConfig {
    /// Directory holding the export files.
    #[arg(long, default_value = ".")]
    pub input_path: String,

    /// Export files to migrate, relative to --input-path.
    #[arg(long, value_delimiter = ',')]
    pub input_files: Vec<String>,

    /// Base URL of the target instance (the /rest/v1/ prefix is appended).
    #[arg(long)]
    pub target_endpoint: String,

    /// Service key for the target instance. Falls back to the
    /// FAIRWAY_API_KEY environment variable.
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "50")]
    pub batch_size: usize,

    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Parse and transform only; skip all inserts.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("target_endpoint", &self.target_endpoint)?;
        validation::validate_path("input_path", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;

        if self.input_files.is_empty() {
            return Err(MigrationError::MissingConfigError {
                field: "input_files".to_string(),
            });
        }
        validation::validate_file_extensions("input_files", &self.input_files, &["csv", "json"])?;

        Ok(())
    }
}

impl ConfigProvider for CliConfig {
    fn target_endpoint(&self) -> &str {
        &self.target_endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn input_files(&self) -> &[String] {
        &self.input_files
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

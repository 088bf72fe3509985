pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::MigrationConfig, CliConfig};
pub use core::{engine::MigrationEngine, pipeline::CsvImportPipeline};
pub use domain::{mapping, scoring};
pub use utils::error::{MigrationError, Result};

use crate::core::ConfigProvider;
use crate::utils::error::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub migration: MigrationMeta,
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationMeta {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub batch_size: Option<usize>,
    pub max_retries: Option<u32>,
    pub dry_run: Option<bool>,
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MigrationError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MigrationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static env-var pattern");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("target.endpoint", &self.target.endpoint)?;
        crate::utils::validation::validate_path("source.input_path", &self.source.input_path)?;
        crate::utils::validation::validate_path("load.output_path", &self.load.output_path)?;

        if self.source.files.is_empty() {
            return Err(MigrationError::MissingConfigError {
                field: "source.files".to_string(),
            });
        }
        crate::utils::validation::validate_file_extensions(
            "source.files",
            &self.source.files,
            &["csv", "json"],
        )?;

        if let Some(batch_size) = self.load.batch_size {
            crate::utils::validation::validate_positive_number("load.batch_size", batch_size, 1)?;
        }

        Ok(())
    }
}

impl ConfigProvider for MigrationConfig {
    fn target_endpoint(&self) -> &str {
        &self.target.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.target.api_key.as_deref()
    }

    fn input_files(&self) -> &[String] {
        &self.source.files
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn batch_size(&self) -> usize {
        self.load.batch_size.unwrap_or(50)
    }

    fn max_retries(&self) -> u32 {
        self.load.max_retries.unwrap_or(3)
    }

    fn dry_run(&self) -> bool {
        self.load.dry_run.unwrap_or(false)
    }
}

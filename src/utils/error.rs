use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing required config field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid config value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Sub-course ranges overlap at hole {hole}")]
    OverlappingSegments { hole: u32 },
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Config,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MigrationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorCategory::Network,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. }
            | Self::OverlappingSegments { .. } => ErrorCategory::Data,
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Config,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient by nature; the batch retry loop usually absorbs these.
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorSeverity::Medium,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. }
            | Self::OverlappingSegments { .. } => ErrorSeverity::High,
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) => {
                "Check network connectivity and the target endpoint, then rerun".to_string()
            }
            Self::ApiStatusError { status, .. } if *status == 401 || *status == 403 => {
                "Check the API key for the target instance".to_string()
            }
            Self::ApiStatusError { .. } => {
                "Inspect the response body; the target may reject the payload shape".to_string()
            }
            Self::CsvError(_) => {
                "Check the export file for malformed rows or a missing header".to_string()
            }
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::SerializationError(_) => {
                "Check that JSON export files contain an array of objects".to_string()
            }
            Self::MissingConfigError { field } => format!("Provide a value for `{}`", field),
            Self::InvalidConfigValueError { field, .. }
            | Self::ConfigValidationError { field, .. } => {
                format!("Fix the `{}` setting and rerun", field)
            }
            Self::ProcessingError { .. } | Self::ValidationError { .. } => {
                "Inspect the rejected rows in the migration report".to_string()
            }
            Self::OverlappingSegments { hole } => format!(
                "Fix the sub-course ranges so hole {} belongs to exactly one segment",
                hole
            ),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the target instance: {}", self),
            ErrorCategory::Data => format!("Export data problem: {}", self),
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

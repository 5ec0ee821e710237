use thiserror::Error;

#[derive(Error, Debug)]
pub enum CostError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("{source_name} returned HTTP {status}: {body}")]
    UpstreamError {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected {source_name} response: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    #[error("No cached data at {path} (offline mode)")]
    CacheMissError { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CostError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CostError::ConfigError { .. }
            | CostError::ConfigValidationError { .. }
            | CostError::InvalidConfigValueError { .. }
            | CostError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CostError::ApiError(_) | CostError::UpstreamError { .. } => ErrorCategory::Network,
            CostError::CsvError(_)
            | CostError::SerializationError(_)
            | CostError::ParseError { .. }
            | CostError::CacheMissError { .. }
            | CostError::ProcessingError { .. }
            | CostError::ValidationError { .. } => ErrorCategory::Data,
            CostError::ZipError(_) | CostError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            CostError::ApiError(_) => ErrorSeverity::Medium,
            CostError::UpstreamError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            CostError::IoError(_) | CostError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            CostError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            CostError::UpstreamError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CostError::ApiError(_) => {
                "Check your network connection, or rerun with --cache-mode offline to use cached data"
            }
            CostError::UpstreamError { status, .. } if *status >= 500 => {
                "The data provider is having trouble; wait and retry, or increase sources.retry_attempts"
            }
            CostError::UpstreamError { .. } => {
                "Check the analysis period and the source endpoints in the configuration"
            }
            CostError::ParseError { .. } => {
                "The provider may have changed its response format; check the endpoint URL"
            }
            CostError::CacheMissError { .. } => {
                "Run once with --cache-mode prefer (or refresh) to populate the cache directory"
            }
            CostError::ConfigError { .. }
            | CostError::ConfigValidationError { .. }
            | CostError::InvalidConfigValueError { .. }
            | CostError::MissingConfigError { .. } => {
                "Review the configuration file and command-line overrides"
            }
            CostError::ProcessingError { .. } | CostError::ValidationError { .. } => {
                "The fetched series may be empty or misaligned; try a different analysis period"
            }
            CostError::CsvError(_) | CostError::SerializationError(_) => {
                "Delete the cache directory and fetch the data again"
            }
            CostError::IoError(_) | CostError::ZipError(_) => {
                "Check that the output and cache directories exist and are writable"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not fetch data: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CostError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BordersError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Dataset request to {url} returned HTTP {status}")]
    HttpStatusError { status: u16, url: String },

    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Points ledger could not be sealed or opened: {message}")]
    CryptoError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BordersError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorCategory::Network,
            Self::GeoJsonError(_)
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. }
            | Self::CryptoError { .. } => ErrorCategory::Data,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ZipError(_) | Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 4xx/5xx from the dataset host usually means "try another year"
            Self::HttpStatusError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) => ErrorSeverity::Medium,
            Self::GeoJsonError(_)
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. }
            | Self::CryptoError { .. } => ErrorSeverity::High,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::ZipError(_) | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check network connectivity and the dataset base_url",
            Self::HttpStatusError { status, .. } if *status == 404 => {
                "The dataset has no file for this year; pick a year from `historic-borders years`"
            }
            Self::HttpStatusError { .. } => "The dataset host rejected the request; retry later",
            Self::GeoJsonError(_) | Self::SerializationError(_) => {
                "The dataset response is not a valid GeoJSON FeatureCollection"
            }
            Self::CsvError(_) | Self::ZipError(_) => "Check the output formats in [load]",
            Self::IoError(_) => "Check that the output path exists and is writable",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and run again",
            Self::ProcessingError { .. } | Self::ValidationError { .. } => {
                "Inspect the input data; run with --verbose for details"
            }
            Self::CryptoError { .. } => {
                "Check points.key (or HISTORIC_BORDERS_POINTS_KEY); delete the points file to start over"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch historical data: {}", self),
            ErrorCategory::Data => format!("Historical data could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BordersError>;

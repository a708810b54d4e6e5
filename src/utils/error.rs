use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unusable content from {url}: {message}")]
    ContentError { url: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Render error: {message}")]
    RenderError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::NetworkError(_) | MapError::ContentError { .. } => ErrorCategory::Network,
            MapError::CsvError(_) | MapError::SerializationError(_) => ErrorCategory::Data,
            MapError::ConfigValidationError { .. } | MapError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            MapError::IoError(_) | MapError::RenderError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 下一次排程會重試，畫面維持舊資料
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// A cycle that failed with a retryable error leaves the display stale
    /// until the next tick.
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MapError::NetworkError(_) => {
                "Check network connectivity; the next refresh will try again"
            }
            MapError::ContentError { .. } => {
                "Make sure the spreadsheet is still published to the web as CSV"
            }
            MapError::CsvError(_) => "Check that the sheet has a header row and valid UTF-8 text",
            MapError::IoError(_) => "Check that the output directory exists and is writable",
            MapError::SerializationError(_) | MapError::RenderError { .. } => {
                "Re-run with --verbose and inspect the rejected record"
            }
            MapError::ConfigValidationError { .. } | MapError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and restart"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MapError::NetworkError(_) => "Could not reach the spreadsheet source".to_string(),
            MapError::ContentError { message, .. } => {
                format!("The spreadsheet source returned unusable content ({})", message)
            }
            MapError::CsvError(_) => "The spreadsheet could not be read as CSV".to_string(),
            MapError::IoError(e) => format!("Could not write map output: {}", e),
            MapError::SerializationError(_) => "Could not encode the map snapshot".to_string(),
            MapError::RenderError { message } => format!("Could not render the map: {}", message),
            MapError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            MapError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input file is empty or has fewer than two rows and two columns")]
    EmptyInputError,

    #[error("Invalid time label '{label}' for domain '{domain}': {reason}")]
    TimeLabelError {
        label: String,
        domain: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Import step '{step}' failed: {message}")]
    ApiError { step: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Validation,
    Network,
    Server,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::CsvError(_) | ImportError::IoError(_) | ImportError::EmptyInputError => {
                ErrorCategory::Input
            }
            ImportError::TimeLabelError { .. } | ImportError::ValidationError { .. } => {
                ErrorCategory::Validation
            }
            ImportError::HttpError(_) => ErrorCategory::Network,
            ImportError::ApiError { .. } => ErrorCategory::Server,
            ImportError::SerializationError(_) | ImportError::ProcessingError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ImportError::ConfigValidationError { field, .. }
            | ImportError::InvalidConfigValueError { field, .. } => {
                format!("Check the '{}' setting in the config file or CLI flags", field)
            }
            ImportError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or pass it on the command line", field)
            }
            ImportError::IoError(_) => "Make sure the input file exists and is readable".to_string(),
            ImportError::CsvError(_) => {
                "Make sure the file is valid CSV and the delimiter matches the extension".to_string()
            }
            ImportError::EmptyInputError => {
                "The file needs a label row, a label column and at least one value".to_string()
            }
            ImportError::TimeLabelError { domain, .. } => format!(
                "Fix the time labels or pick a time domain other than '{}'",
                domain
            ),
            ImportError::ValidationError { .. } => {
                "Fix the reported rows and run the import again".to_string()
            }
            ImportError::HttpError(_) => {
                "Check that the import server is reachable at the configured base_url".to_string()
            }
            ImportError::ApiError { .. } => {
                "Records created before the failing step stay on the server; clean them up before retrying"
                    .to_string()
            }
            ImportError::SerializationError(_) | ImportError::ProcessingError { .. } => {
                "This is likely a bug; run with --verbose and report the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::HttpError(e) if e.is_timeout() => "The import server timed out".to_string(),
            ImportError::HttpError(e) if e.is_connect() => {
                "Could not connect to the import server".to_string()
            }
            ImportError::ApiError { step, message } => {
                format!("Import stopped at '{}': {}", step, message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

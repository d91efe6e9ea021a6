use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
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

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    /// Structural defect in the engine's input (empty series, cross-vendor
    /// series). Retrying with the same input reproduces it.
    #[error("Invalid input: {message}")]
    InvalidInputError { message: String },

    /// The extraction gate refused a snapshot for one release.
    #[error("Malformed snapshot '{release}': {reason}")]
    MalformedSnapshotError { release: String, reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::InvalidInputError { .. }
            | EtlError::MalformedSnapshotError { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient network conditions; a retry may succeed.
            EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::InvalidInputError { .. }
            | EtlError::MalformedSnapshotError { .. }
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and the release page URLs, then retry".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Inspect the snapshot files on disk; re-run the snapshot stage if they are stale"
                    .to_string()
            }
            EtlError::IoError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Fix the configuration file or command-line arguments and re-run".to_string()
            }
            EtlError::InvalidInputError { .. } => {
                "The snapshot series handed to the engine is structurally wrong; \
                 re-run the snapshot stage so the manifest and snapshots agree"
                    .to_string()
            }
            EtlError::MalformedSnapshotError { .. } => {
                "The page layout for this release may have changed; re-fetch it and \
                 inspect the extracted table"
                    .to_string()
            }
            EtlError::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the logs around the failing step".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) => format!("Could not download a release page: {}", e),
            EtlError::MalformedSnapshotError { release, reason } => {
                format!("The supported-CPU table for '{}' is unusable: {}", release, reason)
            }
            EtlError::InvalidInputError { message } => {
                format!("Cannot analyze the snapshot series: {}", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

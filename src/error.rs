use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Training data errors (missing file, missing label column, malformed rows)
    #[error("Data error: {0}")]
    Data(String),

    /// Inference attempted before a successful load or train
    #[error("Model not ready: {0}")]
    ModelNotReady(String),

    /// Inference input could not be coerced into the fitted numeric layout
    #[error("Scaling error: {0}")]
    Scaling(String),

    /// Threshold calibration errors
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Data(_) => "DATA_ERROR",
            AppError::ModelNotReady(_) => "MODEL_NOT_READY",
            AppError::Scaling(_) => "SCALING_ERROR",
            AppError::Calibration(_) => "CALIBRATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Data(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Data("missing label".to_string()).error_code(),
            "DATA_ERROR"
        );
        assert_eq!(
            AppError::ModelNotReady("no artifact".to_string()).error_code(),
            "MODEL_NOT_READY"
        );
        assert_eq!(
            AppError::Scaling("bad shape".to_string()).error_code(),
            "SCALING_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ModelNotReady("train or load an artifact first".to_string());
        assert_eq!(
            err.to_string(),
            "Model not ready: train or load an artifact first"
        );
    }
}

//! Error types module
//!
//! This module provides the core error type used throughout allconv. Errors from
//! configuration, intake, conversion collaborators and download delivery are unified under
//! the `AppError` enum. Per-file conversion failures never cross the session store boundary;
//! they are recorded on the file instead.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like unknown ids or bad input
    Debug,
    /// Warning level - for recoverable issues like a failed conversion
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONVERSION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (the action can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Media conversion error: {0}")]
    MediaConversionError(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<crate::units::UnitError> for AppError {
    fn from(err: crate::units::UnitError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<crate::validation::ValidationError> for AppError {
    fn from(err: crate::validation::ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the provided values and try again"),
            LogLevel::Debug,
        ),
        AppError::UnsupportedFormat(_) => (
            "UNSUPPORTED_FORMAT",
            false,
            Some("Pick one of the supported output formats"),
            LogLevel::Debug,
        ),
        AppError::ImageProcessing(_) => (
            "IMAGE_PROCESSING_ERROR",
            false,
            Some("Check image format and try a different file"),
            LogLevel::Warn,
        ),
        AppError::MediaConversionError(_) => (
            "MEDIA_CONVERSION_ERROR",
            true,
            Some("Start the conversion again"),
            LogLevel::Warn,
        ),
        AppError::Delivery(_) => (
            "DELIVERY_ERROR",
            true,
            Some("Check the output location and download again"),
            LogLevel::Error,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Fix the ALLCONV_* environment variables"),
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed reports
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::ImageProcessing(_) => "ImageProcessing",
            AppError::MediaConversionError(_) => "MediaConversionError",
            AppError::Delivery(_) => "Delivery",
            AppError::Config(_) => "Config",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UnsupportedFormat(ref fmt) => format!("Format '{}' is not supported", fmt),
            AppError::ImageProcessing(ref msg) => msg.clone(),
            AppError::MediaConversionError(_) => "Conversion failed".to_string(),
            AppError::Delivery(_) => "Download failed".to_string(),
            AppError::Config(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}

/// Logs `error` at the level its metadata asks for.
pub fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let error_code = error.error_code();
    let recoverable = error.is_recoverable();
    let action = error.suggested_action();
    let details = error.detailed_message();

    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %details,
            error_type,
            error_code,
            recoverable,
            suggested_action = ?action,
            "Error occurred"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %details,
            error_type,
            error_code,
            recoverable,
            suggested_action = ?action,
            "Error occurred"
        ),
        LogLevel::Error => tracing::error!(
            error = %details,
            error_type,
            error_code,
            recoverable,
            suggested_action = ?action,
            "Error occurred"
        ),
    }
}

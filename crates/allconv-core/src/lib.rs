//! allconv core library
//!
//! This crate provides the domain models, error types, configuration, intake validation
//! and unit conversion tables shared by every allconv component.

pub mod config;
pub mod error;
pub mod models;
pub mod units;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::SessionConfig;
pub use error::{log_error, AppError, ErrorMetadata, LogLevel};
pub use models::{
    ConversionRunState, ConversionSettings, ConvertedArtifact, FileStatus, QueuedFile, RawFile,
    ResourceRef, SessionSnapshot, SessionSummary, SettingsUpdate, SourceHandle,
};
pub use units::{convert_units, format_converted, UnitCategory, UnitError};
pub use utils::{derive_output_name, format_file_size};
pub use validation::{Admission, IntakePolicy, ValidationError};

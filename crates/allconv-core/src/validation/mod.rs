//! Intake validation
//!
//! The acquisition surface (file picker, drag and drop, CLI) applies an [`IntakePolicy`]
//! before handing files to the session store. The store itself enforces no limit.

use crate::config::SessionConfig;
use crate::models::RawFile;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Queue is full: {existing} of {max} files already added")]
    QueueFull { existing: usize, max: usize },

    #[error("Format not accepted: {name} ({mime_type})")]
    NotAccepted { name: String, mime_type: String },

    #[error("Empty file: {0}")]
    EmptyFile(String),
}

/// Limits applied to incoming files before they reach the queue.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    max_files: usize,
    accepted_formats: Vec<String>,
}

/// Result of admitting a batch of files.
#[derive(Debug, Default)]
pub struct Admission {
    pub admitted: Vec<RawFile>,
    pub rejected: Vec<ValidationError>,
}

impl IntakePolicy {
    pub fn new(max_files: usize, accepted_formats: Vec<String>) -> Self {
        let accepted_formats = if accepted_formats.is_empty() {
            vec!["*/*".to_string()]
        } else {
            accepted_formats
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .collect()
        };
        Self {
            max_files,
            accepted_formats,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_files, config.accepted_formats.clone())
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Whether `file` matches one of the accepted patterns.
    ///
    /// Patterns are `*/*`, a mime family (`image/*`), an exact mime type (`image/png`)
    /// or an extension (`.png`).
    pub fn accepts(&self, file: &RawFile) -> bool {
        let mime = file.mime_type.to_lowercase();
        let extension = file.extension();

        self.accepted_formats.iter().any(|pattern| {
            if pattern == "*/*" || pattern == "*" {
                true
            } else if let Some(ext) = pattern.strip_prefix('.') {
                extension.as_deref() == Some(ext)
            } else if let Some(family) = pattern.strip_suffix("/*") {
                mime.split('/').next() == Some(family)
            } else {
                *pattern == mime
            }
        })
    }

    /// Admits files in order until the queue would exceed `max_files`.
    ///
    /// Files past the limit and files that do not match an accepted pattern are reported
    /// in `rejected`; the rest keep their original order.
    pub fn admit(&self, existing: usize, files: Vec<RawFile>) -> Admission {
        let mut admission = Admission::default();
        let mut remaining = self.max_files.saturating_sub(existing);

        for file in files {
            if file.data.is_empty() {
                admission.rejected.push(ValidationError::EmptyFile(file.name));
                continue;
            }
            if !self.accepts(&file) {
                admission.rejected.push(ValidationError::NotAccepted {
                    name: file.name,
                    mime_type: file.mime_type,
                });
                continue;
            }
            if remaining == 0 {
                admission.rejected.push(ValidationError::QueueFull {
                    existing: existing + admission.admitted.len(),
                    max: self.max_files,
                });
                continue;
            }
            remaining -= 1;
            admission.admitted.push(file);
        }

        if !admission.rejected.is_empty() {
            tracing::debug!(
                admitted = admission.admitted.len(),
                rejected = admission.rejected.len(),
                "Intake rejected some files"
            );
        }

        admission
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

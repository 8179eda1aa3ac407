use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::ResourceRef;

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Nominal state for files still being acquired; no current flow produces it.
    Uploading,
    #[default]
    Queued,
    Converting,
    Completed,
    Error,
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileStatus::Uploading => write!(f, "uploading"),
            FileStatus::Queued => write!(f, "queued"),
            FileStatus::Converting => write!(f, "converting"),
            FileStatus::Completed => write!(f, "completed"),
            FileStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(FileStatus::Uploading),
            "queued" => Ok(FileStatus::Queued),
            "converting" => Ok(FileStatus::Converting),
            "completed" => Ok(FileStatus::Completed),
            "error" => Ok(FileStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

/// Raw input bytes of a queued file.
///
/// Cloning is cheap (reference counted); the queue entry is the only long-lived owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHandle(Bytes);

impl SourceHandle {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A file handed over by the acquisition surface (file picker, drag and drop, CLI args).
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub data: SourceHandle,
}

impl RawFile {
    /// Builds a raw file whose size is taken from the payload.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = SourceHandle::new(data);
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_lowercase().starts_with("image/")
    }

    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Produced output of one successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertedArtifact {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub download: ResourceRef,
}

impl ConvertedArtifact {
    pub fn artifact_id(file_id: Uuid) -> String {
        format!("output-{}", file_id)
    }
}

/// One entry in the session queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedFile {
    pub id: Uuid,
    #[serde(skip)]
    pub source: SourceHandle,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub preview: Option<ResourceRef>,
    pub status: FileStatus,
    pub progress: u8,
    pub error_message: Option<String>,
    pub output: Option<ConvertedArtifact>,
    pub added_at: DateTime<Utc>,
}

impl QueuedFile {
    /// Creates a queued entry for `raw`. The caller allocates the preview reference.
    pub fn from_raw(raw: RawFile, preview: Option<ResourceRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: raw.data,
            name: raw.name,
            size_bytes: raw.size_bytes,
            mime_type: raw.mime_type,
            preview,
            status: FileStatus::Queued,
            progress: 0,
            error_message: None,
            output: None,
            added_at: Utc::now(),
        }
    }

    /// Raw view of the source as handed to a converter.
    pub fn raw(&self) -> RawFile {
        RawFile {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            mime_type: self.mime_type.clone(),
            data: self.source.clone(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == FileStatus::Completed
    }

    /// Every resource reference owned by this entry.
    pub fn owned_refs(&self) -> Vec<ResourceRef> {
        self.preview
            .into_iter()
            .chain(self.output.as_ref().map(|o| o.download))
            .collect()
    }
}

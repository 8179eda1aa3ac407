use serde::{Deserialize, Serialize};

use super::{ConversionRunState, ConversionSettings, FileStatus, QueuedFile};

/// Point-in-time copy of a whole session, handed to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub files: Vec<QueuedFile>,
    pub settings: ConversionSettings,
    pub run_state: ConversionRunState,
}

impl SessionSnapshot {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_files(&self.files)
    }

    pub fn converting_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Converting)
            .count()
    }
}

/// Aggregate counts shown next to the run controls.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub queued: usize,
    pub converting: usize,
}

impl SessionSummary {
    pub fn from_files(files: &[QueuedFile]) -> Self {
        files.iter().fold(
            SessionSummary {
                total: files.len(),
                ..Self::default()
            },
            |mut acc, f| {
                match f.status {
                    FileStatus::Completed => acc.completed += 1,
                    FileStatus::Error => acc.failed += 1,
                    FileStatus::Converting => acc.converting += 1,
                    FileStatus::Queued | FileStatus::Uploading => acc.queued += 1,
                }
                acc
            },
        )
    }

    pub fn has_completed(&self) -> bool {
        self.completed > 0
    }

    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawFile;

    fn file_with(status: FileStatus) -> QueuedFile {
        let mut f = QueuedFile::from_raw(RawFile::new("a.png", "image/png", vec![1u8]), None);
        f.status = status;
        f
    }

    #[test]
    fn summary_counts_each_status() {
        let files = vec![
            file_with(FileStatus::Completed),
            file_with(FileStatus::Completed),
            file_with(FileStatus::Error),
            file_with(FileStatus::Queued),
            file_with(FileStatus::Converting),
        ];
        let summary = SessionSummary::from_files(&files);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.queued, 1);
        assert_eq!(summary.converting, 1);
        assert!(summary.has_completed());
        assert!(!summary.all_completed());
    }

    #[test]
    fn empty_session_is_not_all_completed() {
        let summary = SessionSummary::from_files(&[]);
        assert!(!summary.all_completed());
        assert!(!summary.has_completed());
    }
}

//! Change notifications emitted by the session store.
//!
//! Every mutation publishes one event on a broadcast channel; subscribers that only need
//! current state can call `snapshot()` whenever an event arrives.

use allconv_core::ConversionSettings;
use serde::Serialize;
use uuid::Uuid;

/// Totals of one run of the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// False when the call found a run already active and did nothing.
    pub started: bool,
    pub completed: usize,
    pub failed: usize,
    /// Files already completed before the run, left untouched.
    pub skipped: usize,
    /// Files removed from the queue while the run was going.
    pub removed: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    FilesAdded { ids: Vec<Uuid> },
    FileRemoved { id: Uuid },
    SettingsUpdated { settings: ConversionSettings },
    RunStarted { pending: usize },
    FileStarted { id: Uuid },
    Progress { id: Uuid, progress: u8 },
    FileCompleted { id: Uuid, output_name: String },
    FileFailed { id: Uuid, message: String },
    RunPaused,
    RunResumed,
    RunCancelled,
    RunFinished { summary: RunSummary },
    Downloaded { id: Uuid, name: String },
    SessionCleared,
}

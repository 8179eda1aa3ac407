use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall state of the simulated conversion run.
///
/// `is_paused` only carries meaning while `is_running` is true.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionRunState {
    pub is_running: bool,
    pub is_paused: bool,
    /// Display estimate derived from the tick schedule, not from real throughput.
    pub estimated_time_label: Option<String>,
    pub current_file: Option<Uuid>,
}

impl ConversionRunState {
    pub fn started(estimated_time_label: Option<String>) -> Self {
        Self {
            is_running: true,
            is_paused: false,
            estimated_time_label,
            current_file: None,
        }
    }

    /// State after a cancel: nothing running, nothing paused.
    pub fn reset() -> Self {
        Self::default()
    }

    pub fn is_active_and_paused(&self) -> bool {
        self.is_running && self.is_paused
    }
}

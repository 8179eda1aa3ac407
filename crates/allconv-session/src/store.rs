//! Conversion session store
//!
//! [`ConversionSessionStore`] is the single owner of the file queue, the conversion
//! settings and the run state. Every mutation goes through one mutex, which keeps the
//! sequential processing guarantee even when the store is shared between tasks.
//!
//! Run control (pause, resume, cancel) travels on a `watch` channel next to the state so
//! the driver can sleep until it is signalled instead of polling.

use allconv_core::{
    ConversionRunState, ConversionSettings, FileStatus, QueuedFile, RawFile, SessionConfig,
    SessionSnapshot, SessionSummary, SettingsUpdate,
};
use allconv_processing::{Converter, DownloadSink, ResourceRegistry};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, MutexGuard};
use uuid::Uuid;

use crate::events::SessionEvent;

/// Signal shared between the store and the run driver.
///
/// `generation` changes on every start, cancel and clear; a driver whose generation is
/// no longer current stops at its next check point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunControl {
    pub generation: u64,
    pub paused: bool,
}

pub(crate) struct SessionState {
    pub files: Vec<QueuedFile>,
    pub settings: ConversionSettings,
    pub run_state: ConversionRunState,
}

impl SessionState {
    pub fn file_mut(&mut self, id: Uuid) -> Option<&mut QueuedFile> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    pub fn file(&self, id: Uuid) -> Option<&QueuedFile> {
        self.files.iter().find(|f| f.id == id)
    }
}

pub(crate) struct Inner {
    pub state: Mutex<SessionState>,
    pub control: watch::Sender<RunControl>,
    pub events: broadcast::Sender<SessionEvent>,
    pub converter: Arc<dyn Converter>,
    pub sink: Arc<dyn DownloadSink>,
    pub resources: ResourceRegistry,
    pub config: SessionConfig,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let refs: Vec<_> = state.files.iter().flat_map(|f| f.owned_refs()).collect();
        let released = self.resources.release_all(refs);
        if released > 0 {
            tracing::debug!(released, "Session dropped, resources released");
        }
    }
}

/// Queue, settings and run state of one conversion session.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct ConversionSessionStore {
    pub(crate) inner: Arc<Inner>,
}

impl ConversionSessionStore {
    pub fn new(
        config: SessionConfig,
        converter: Arc<dyn Converter>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        Self::with_resources(config, converter, sink, ResourceRegistry::new())
    }

    /// Like [`new`](Self::new) but issuing references from an existing registry.
    pub fn with_resources(
        config: SessionConfig,
        converter: Arc<dyn Converter>,
        sink: Arc<dyn DownloadSink>,
        resources: ResourceRegistry,
    ) -> Self {
        let (control, _) = watch::channel(RunControl::default());
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let state = SessionState {
            files: Vec::new(),
            settings: config.default_settings.clone(),
            run_state: ConversionRunState::default(),
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                control,
                events,
                converter,
                sink,
                resources,
                config,
            }),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().await
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Registry backing preview and download references.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.inner.resources
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Appends `files` to the queue in order and returns their new ids.
    ///
    /// Image files get a preview reference. No size or count limit is applied here.
    #[tracing::instrument(skip(self, files), fields(count = files.len()))]
    pub async fn enqueue(&self, files: Vec<RawFile>) -> Vec<Uuid> {
        let mut state = self.lock().await;
        let mut ids = Vec::with_capacity(files.len());

        for raw in files {
            let preview = raw.is_image().then(|| {
                self.inner
                    .resources
                    .register(raw.data.bytes().clone(), raw.mime_type.clone())
            });
            let file = QueuedFile::from_raw(raw, preview);
            tracing::debug!(
                file_id = %file.id,
                name = %file.name,
                size = file.size_bytes,
                "File queued"
            );
            ids.push(file.id);
            state.files.push(file);
        }

        drop(state);
        self.emit(SessionEvent::FilesAdded { ids: ids.clone() });
        ids
    }

    /// Removes one file and releases its preview and artifact references.
    ///
    /// Returns false, leaving the queue untouched, when `file_id` is unknown.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, file_id: Uuid) -> bool {
        let mut state = self.lock().await;
        let Some(pos) = state.files.iter().position(|f| f.id == file_id) else {
            tracing::debug!(file_id = %file_id, "Remove ignored, file not in queue");
            return false;
        };

        let file = state.files.remove(pos);
        drop(state);

        let released = self.inner.resources.release_all(file.owned_refs());
        tracing::debug!(file_id = %file_id, released, "File removed");
        self.emit(SessionEvent::FileRemoved { id: file_id });
        true
    }

    /// Shallow-merges `update` into the current settings and returns the result.
    ///
    /// A running conversion picks the new settings up for every file not converted yet.
    pub async fn update_settings(&self, update: SettingsUpdate) -> ConversionSettings {
        let mut state = self.lock().await;
        state.settings.merge(update);
        let settings = state.settings.clone();
        drop(state);

        tracing::debug!(format = %settings.format, quality = ?settings.quality, "Settings updated");
        self.emit(SessionEvent::SettingsUpdated {
            settings: settings.clone(),
        });
        settings
    }

    /// Stops advancing the in-flight file until [`resume_run`](Self::resume_run).
    ///
    /// Returns false when no run is active.
    pub async fn pause_run(&self) -> bool {
        let mut state = self.lock().await;
        if !state.run_state.is_running {
            return false;
        }
        state.run_state.is_paused = true;
        self.inner.control.send_modify(|c| c.paused = true);
        drop(state);

        tracing::info!("Conversion paused");
        self.emit(SessionEvent::RunPaused);
        true
    }

    /// Lets a paused run continue. Returns false when no run is active.
    pub async fn resume_run(&self) -> bool {
        let mut state = self.lock().await;
        if !state.run_state.is_running {
            return false;
        }
        state.run_state.is_paused = false;
        self.inner.control.send_modify(|c| c.paused = false);
        drop(state);

        tracing::info!("Conversion resumed");
        self.emit(SessionEvent::RunResumed);
        true
    }

    /// Stops the run and puts every file back to `Queued` with zero progress.
    ///
    /// Completed files are reset too but keep their artifact, so a later download still
    /// finds it. The driver notices the cancel at its next progress tick.
    pub async fn cancel_run(&self) {
        let mut state = self.lock().await;
        state.run_state = ConversionRunState::reset();
        for file in state.files.iter_mut() {
            file.status = FileStatus::Queued;
            file.progress = 0;
            file.error_message = None;
        }
        self.inner.control.send_modify(|c| {
            c.generation += 1;
            c.paused = false;
        });
        drop(state);

        tracing::info!("Conversion cancelled");
        self.emit(SessionEvent::RunCancelled);
    }

    /// Empties the session, releasing every reference and stopping any run.
    pub async fn clear(&self) {
        let mut state = self.lock().await;
        let files = std::mem::take(&mut state.files);
        state.run_state = ConversionRunState::reset();
        self.inner.control.send_modify(|c| {
            c.generation += 1;
            c.paused = false;
        });
        drop(state);

        let released = self
            .inner
            .resources
            .release_all(files.iter().flat_map(|f| f.owned_refs()));
        tracing::info!(files = files.len(), released, "Session cleared");
        self.emit(SessionEvent::SessionCleared);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock().await;
        SessionSnapshot {
            files: state.files.clone(),
            settings: state.settings.clone(),
            run_state: state.run_state.clone(),
        }
    }

    pub async fn files(&self) -> Vec<QueuedFile> {
        self.lock().await.files.clone()
    }

    pub async fn file(&self, file_id: Uuid) -> Option<QueuedFile> {
        self.lock().await.file(file_id).cloned()
    }

    pub async fn settings(&self) -> ConversionSettings {
        self.lock().await.settings.clone()
    }

    pub async fn run_state(&self) -> ConversionRunState {
        self.lock().await.run_state.clone()
    }

    pub async fn summary(&self) -> SessionSummary {
        SessionSummary::from_files(&self.lock().await.files)
    }
}

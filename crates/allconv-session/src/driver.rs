//! Sequential run driver
//!
//! Walks the queue one file at a time. Each file's progress is advanced in fixed steps on a
//! timer, then the converter is invoked with the settings current at that moment.

use allconv_core::{
    derive_output_name, log_error, AppError, ConversionRunState, ConvertedArtifact,
    ErrorMetadata, FileStatus,
};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::events::{RunSummary, SessionEvent};
use crate::store::{ConversionSessionStore, RunControl};

struct RunPlan {
    generation: u64,
    ids: Vec<Uuid>,
}

enum FileOutcome {
    Completed,
    Failed,
    Skipped,
    Removed,
    Cancelled,
}

impl ConversionSessionStore {
    /// Converts every queued file in order and returns when the run ends.
    ///
    /// Completed files are skipped. A call made while another run is active does nothing
    /// and returns a summary with `started == false`.
    pub async fn start_run(&self) -> RunSummary {
        match self.begin_run().await {
            Some(plan) => self.drive(plan).await,
            None => RunSummary::default(),
        }
    }

    /// Same as [`start_run`](Self::start_run) but driven on a background task.
    ///
    /// The run is marked active before this returns, so a pause or cancel issued right
    /// after is never lost.
    pub async fn spawn_run(&self) -> JoinHandle<RunSummary> {
        let plan = self.begin_run().await;
        let store = self.clone();
        tokio::spawn(async move {
            match plan {
                Some(plan) => store.drive(plan).await,
                None => RunSummary::default(),
            }
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.control.borrow().generation == generation
    }

    async fn begin_run(&self) -> Option<RunPlan> {
        let mut state = self.lock().await;
        if state.run_state.is_running {
            tracing::debug!("Run already active, start ignored");
            return None;
        }

        let ids: Vec<Uuid> = state.files.iter().map(|f| f.id).collect();
        let pending = state.files.iter().filter(|f| !f.is_completed()).count();
        let estimate = run_estimate(self.inner.config.simulated_duration_per_file(), pending);
        state.run_state = ConversionRunState::started(Some(estimate_label(estimate)));

        let mut generation = 0;
        self.inner.control.send_modify(|c| {
            c.generation += 1;
            c.paused = false;
            generation = c.generation;
        });
        drop(state);

        tracing::info!(files = ids.len(), pending, "Conversion run started");
        self.emit(SessionEvent::RunStarted { pending });
        Some(RunPlan { generation, ids })
    }

    async fn drive(&self, plan: RunPlan) -> RunSummary {
        let mut summary = RunSummary {
            started: true,
            ..RunSummary::default()
        };
        let mut control = self.inner.control.subscribe();

        for id in plan.ids {
            match self.convert_file(&mut control, plan.generation, id).await {
                FileOutcome::Completed => summary.completed += 1,
                FileOutcome::Failed => summary.failed += 1,
                FileOutcome::Skipped => summary.skipped += 1,
                FileOutcome::Removed => summary.removed += 1,
                FileOutcome::Cancelled => {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        let mut state = self.lock().await;
        if !self.is_current(plan.generation) {
            summary.cancelled = true;
            tracing::info!(
                completed = summary.completed,
                failed = summary.failed,
                "Conversion run stopped by cancel"
            );
            return summary;
        }
        state.run_state.is_running = false;
        state.run_state.current_file = None;
        drop(state);

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            removed = summary.removed,
            "Conversion run finished"
        );
        self.emit(SessionEvent::RunFinished { summary });
        summary
    }

    async fn convert_file(
        &self,
        control: &mut watch::Receiver<RunControl>,
        generation: u64,
        id: Uuid,
    ) -> FileOutcome {
        {
            let mut state = self.lock().await;
            if !self.is_current(generation) {
                return FileOutcome::Cancelled;
            }
            let Some(file) = state.file_mut(id) else {
                return FileOutcome::Removed;
            };
            if file.is_completed() {
                tracing::debug!(file_id = %id, "Already completed, skipped");
                return FileOutcome::Skipped;
            }
            file.status = FileStatus::Converting;
            file.progress = 0;
            file.error_message = None;
            state.run_state.current_file = Some(id);
        }
        self.emit(SessionEvent::FileStarted { id });

        let step = self.inner.config.progress_step.max(1);
        let mut progress: u8 = 0;
        loop {
            // Holds here while paused; a cancel wakes it up too.
            if control
                .wait_for(|c| c.generation != generation || !c.paused)
                .await
                .is_err()
            {
                return FileOutcome::Cancelled;
            }

            {
                let mut state = self.lock().await;
                if !self.is_current(generation) {
                    return FileOutcome::Cancelled;
                }
                let Some(file) = state.file_mut(id) else {
                    return FileOutcome::Removed;
                };
                file.progress = progress;
            }
            tracing::trace!(file_id = %id, progress, "Progress");
            self.emit(SessionEvent::Progress { id, progress });

            tokio::time::sleep(self.inner.config.tick_interval).await;
            if progress >= 100 {
                break;
            }
            progress = progress.saturating_add(step).min(100);
        }

        let (input, settings) = {
            let state = self.lock().await;
            if !self.is_current(generation) {
                return FileOutcome::Cancelled;
            }
            let Some(file) = state.file(id) else {
                return FileOutcome::Removed;
            };
            (file.raw(), state.settings.clone())
        };

        let result = self.inner.converter.convert(&input, &settings).await;

        let mut state = self.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(file_id = %id, "Conversion result discarded after cancel");
            return FileOutcome::Cancelled;
        }
        let Some(file) = state.file_mut(id) else {
            tracing::debug!(file_id = %id, "Conversion result discarded, file removed");
            return FileOutcome::Removed;
        };

        let outcome = match result {
            Ok(converted) => {
                let name = derive_output_name(&file.name, &settings.format);
                let download = self
                    .inner
                    .resources
                    .register(converted.data.clone(), converted.mime_type.clone());
                let previous = file.output.replace(ConvertedArtifact {
                    id: ConvertedArtifact::artifact_id(id),
                    name: name.clone(),
                    size_bytes: converted.data.len() as u64,
                    mime_type: converted.mime_type,
                    download,
                });
                if let Some(previous) = previous {
                    self.inner.resources.release(&previous.download);
                }
                file.status = FileStatus::Completed;
                file.progress = 100;
                file.error_message = None;

                tracing::info!(
                    file_id = %id,
                    output = %name,
                    size = converted.data.len(),
                    "File converted"
                );
                (FileOutcome::Completed, SessionEvent::FileCompleted { id, output_name: name })
            }
            Err(e) => {
                let cause = failure_cause(e);
                let span = tracing::warn_span!("file_failed", file_id = %id, name = %file.name);
                span.in_scope(|| log_error(&cause));
                // The file records the generic message whatever the cause.
                let message = AppError::MediaConversionError(cause.to_string()).client_message();
                file.status = FileStatus::Error;
                file.error_message = Some(message.clone());
                (FileOutcome::Failed, SessionEvent::FileFailed { id, message })
            }
        };
        state.run_state.current_file = None;
        drop(state);

        self.emit(outcome.1);
        outcome.0
    }
}

/// Typed cause of a converter failure. Errors that are not an [`AppError`] count as a
/// generic conversion failure.
fn failure_cause(err: anyhow::Error) -> AppError {
    match err.downcast::<AppError>() {
        Ok(app) => app,
        Err(other) => AppError::MediaConversionError(format!("{:#}", other)),
    }
}

/// Simulated time for `pending` files, saturating instead of overflowing.
fn run_estimate(per_file: Duration, pending: usize) -> Duration {
    per_file.saturating_mul(u32::try_from(pending).unwrap_or(u32::MAX))
}

/// Rough remaining-time label for `total`, e.g. `"22 seconds"` or `"2 minutes"`.
fn estimate_label(total: Duration) -> String {
    fn plural(n: u64, unit: &str) -> String {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    }

    let secs = total.as_secs();
    match secs {
        0..=59 => plural(secs, "second"),
        60..=3599 => plural(secs.div_ceil(60), "minute"),
        _ => plural(secs.div_ceil(3600), "hour"),
    }
}

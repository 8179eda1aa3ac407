//! Download mediation
//!
//! Resolves a file's artifact reference and hands the bytes to the session's
//! [`DownloadSink`](allconv_processing::DownloadSink).

use allconv_core::{log_error, AppError, FileStatus};
use allconv_processing::Delivery;
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::events::SessionEvent;
use crate::store::ConversionSessionStore;

/// Result of a single download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The converted artifact was delivered.
    Artifact { name: String },
    /// A completed file without an artifact; the original bytes were delivered instead.
    Original { name: String },
    /// The file has no artifact and is not completed.
    NotReady,
    NotFound,
}

impl DownloadOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            DownloadOutcome::Artifact { .. } | DownloadOutcome::Original { .. }
        )
    }
}

enum Target {
    Artifact {
        name: String,
        download: allconv_core::ResourceRef,
    },
    Original {
        name: String,
        mime_type: String,
        data: Bytes,
    },
}

impl ConversionSessionStore {
    /// Delivers the artifact of `file_id`, or its original bytes when the file is
    /// completed without one.
    ///
    /// An artifact kept through a cancel is still delivered even though the file is back
    /// to `Queued`.
    #[tracing::instrument(skip(self))]
    pub async fn download_one(&self, file_id: Uuid) -> Result<DownloadOutcome, AppError> {
        let target = {
            let state = self.lock().await;
            let Some(file) = state.file(file_id) else {
                return Ok(DownloadOutcome::NotFound);
            };
            match (&file.output, file.status) {
                (Some(output), _) => Target::Artifact {
                    name: output.name.clone(),
                    download: output.download,
                },
                (None, FileStatus::Completed) => Target::Original {
                    name: file.name.clone(),
                    mime_type: file.mime_type.clone(),
                    data: file.source.bytes().clone(),
                },
                _ => return Ok(DownloadOutcome::NotReady),
            }
        };

        let outcome = match target {
            Target::Artifact { name, download } => {
                let resource = self.inner.resources.resolve(&download).ok_or_else(|| {
                    AppError::Internal(format!("Download reference {} is not live", download))
                })?;
                self.deliver(Delivery {
                    reference: download,
                    suggested_name: name.clone(),
                    mime_type: resource.mime_type,
                    data: resource.data,
                })
                .await?;
                DownloadOutcome::Artifact { name }
            }
            Target::Original {
                name,
                mime_type,
                data,
            } => {
                let reference = self.inner.resources.register(data.clone(), mime_type.clone());
                let delivered = self
                    .deliver(Delivery {
                        reference,
                        suggested_name: name.clone(),
                        mime_type,
                        data,
                    })
                    .await;
                self.inner.resources.release(&reference);
                delivered?;
                DownloadOutcome::Original { name }
            }
        };

        if let DownloadOutcome::Artifact { name } | DownloadOutcome::Original { name } = &outcome {
            tracing::info!(file_id = %file_id, name = %name, "File downloaded");
            self.emit(SessionEvent::Downloaded {
                id: file_id,
                name: name.clone(),
            });
        }
        Ok(outcome)
    }

    /// Downloads every completed file in queue order, pausing `download_stagger` between
    /// deliveries. Returns how many were delivered; failures are logged and skipped.
    pub async fn download_all(&self) -> usize {
        let ids: Vec<Uuid> = {
            let state = self.lock().await;
            state
                .files
                .iter()
                .filter(|f| f.status == FileStatus::Completed)
                .map(|f| f.id)
                .collect()
        };

        let mut delivered = 0;
        for (i, id) in ids.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.inner.config.download_stagger).await;
            }
            match self.download_one(id).await {
                Ok(outcome) if outcome.is_delivered() => delivered += 1,
                Ok(outcome) => {
                    tracing::debug!(file_id = %id, ?outcome, "Skipped during bulk download")
                }
                Err(e) => {
                    let span = tracing::warn_span!("bulk_download", file_id = %id);
                    span.in_scope(|| log_error(&e));
                }
            }
        }

        tracing::info!(delivered, "Bulk download finished");
        delivered
    }

    async fn deliver(&self, delivery: Delivery) -> Result<(), AppError> {
        self.inner
            .sink
            .deliver(delivery)
            .await
            .map_err(|e| AppError::Delivery(format!("{:#}", e)))
    }
}

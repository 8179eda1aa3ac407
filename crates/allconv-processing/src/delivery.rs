//! Download delivery
//!
//! A [`DownloadSink`] receives resolved artifact bytes plus a suggested filename and
//! hands them to the user. [`LocalDirectorySink`] saves them into a directory.

use allconv_core::ResourceRef;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

/// One download handed to a sink.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub reference: ResourceRef,
    pub suggested_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn deliver(&self, delivery: Delivery) -> anyhow::Result<()>;
}

/// Reduces a suggested name to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "download".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "download".to_string()
    } else {
        s
    }
}

/// Saves deliveries into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct LocalDirectorySink {
    base_path: PathBuf,
}

impl LocalDirectorySink {
    /// Creates the sink, creating `base_path` if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.with_context(|| {
            format!("Failed to create output directory {}", base_path.display())
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// First free path for `name`: `a.png`, then `a (1).png`, `a (2).png`, ...
    async fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.base_path.join(name);
        if !fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let path = Path::new(name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        let extension = path.extension().and_then(|e| e.to_str());

        let mut n = 1u32;
        loop {
            let next = match extension {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            let candidate = self.base_path.join(next);
            if !fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl DownloadSink for LocalDirectorySink {
    async fn deliver(&self, delivery: Delivery) -> anyhow::Result<()> {
        let name = sanitize_filename(&delivery.suggested_name);
        let path = self.free_path(&name).await;
        fs::write(&path, &delivery.data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            bytes = delivery.data.len(),
            mime_type = %delivery.mime_type,
            "Download saved"
        );
        Ok(())
    }
}

//! Conversion backend contract
//!
//! The session store hands each file to a [`Converter`] once its simulated progress
//! reaches 100 percent. Any error is treated as a per-file failure by the caller.

use allconv_core::{ConversionSettings, RawFile};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::format::mime_for_format;

/// Bytes produced by a conversion, labelled with their mime type.
#[derive(Debug, Clone)]
pub struct ConvertedBytes {
    pub data: Bytes,
    pub mime_type: String,
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` according to `settings`.
    async fn convert(
        &self,
        input: &RawFile,
        settings: &ConversionSettings,
    ) -> anyhow::Result<ConvertedBytes>;
}

/// Returns the source bytes unchanged, labelled with the target format's mime type.
///
/// Stands in for backends (video, audio, documents) that do not exist in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl PassthroughConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Converter for PassthroughConverter {
    async fn convert(
        &self,
        input: &RawFile,
        settings: &ConversionSettings,
    ) -> anyhow::Result<ConvertedBytes> {
        tracing::debug!(
            name = %input.name,
            format = %settings.format,
            "Pass-through conversion"
        );
        Ok(ConvertedBytes {
            data: input.data.bytes().clone(),
            mime_type: mime_for_format(&settings.format),
        })
    }
}

/// Sends `image/*` inputs to one converter and everything else to another.
pub struct RoutingConverter {
    image: Arc<dyn Converter>,
    fallback: Arc<dyn Converter>,
}

impl RoutingConverter {
    pub fn new(image: Arc<dyn Converter>, fallback: Arc<dyn Converter>) -> Self {
        Self { image, fallback }
    }
}

#[async_trait]
impl Converter for RoutingConverter {
    async fn convert(
        &self,
        input: &RawFile,
        settings: &ConversionSettings,
    ) -> anyhow::Result<ConvertedBytes> {
        if input.is_image() {
            self.image.convert(input, settings).await
        } else {
            self.fallback.convert(input, settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FailingConverter;

    #[async_trait]
    impl Converter for FailingConverter {
        async fn convert(
            &self,
            _input: &RawFile,
            _settings: &ConversionSettings,
        ) -> anyhow::Result<ConvertedBytes> {
            Err(anyhow!("backend unavailable"))
        }
    }

    #[tokio::test]
    async fn passthrough_keeps_bytes_and_labels_target() {
        let input = RawFile::new("talk.wav", "audio/wav", vec![1u8, 2, 3]);
        let settings = ConversionSettings {
            format: "mp3".into(),
            ..ConversionSettings::default()
        };
        let out = PassthroughConverter::new()
            .convert(&input, &settings)
            .await
            .unwrap();
        assert_eq!(out.data.as_ref(), &[1u8, 2, 3]);
        assert_eq!(out.mime_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn routing_sends_images_to_image_backend() {
        let router = RoutingConverter::new(
            Arc::new(FailingConverter),
            Arc::new(PassthroughConverter::new()),
        );
        let settings = ConversionSettings::default();

        let image = RawFile::new("a.png", "image/png", vec![0u8; 4]);
        assert!(router.convert(&image, &settings).await.is_err());

        let video = RawFile::new("a.mp4", "video/mp4", vec![0u8; 4]);
        assert!(router.convert(&video, &settings).await.is_ok());
    }
}

//! Image re-encoding backend
//!
//! Decodes the source with the `image` crate and writes it back in the target raster
//! format. JPEG honors the quality setting; an optional `WIDTHxHEIGHT` resolution
//! resizes the image to fit inside those bounds.

use allconv_core::{AppError, ConversionSettings, RawFile};
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use crate::converter::{ConvertedBytes, Converter};
use crate::format::RasterFormat;

/// Parses `WIDTHxHEIGHT` (also `W*H` and `W X H`).
pub fn parse_resolution(s: &str) -> Option<(u32, u32)> {
    let normalized = s.trim().to_lowercase().replace(' ', "");
    let (w, h) = normalized.split_once(|c| c == 'x' || c == '*')?;
    let width = w.parse().ok()?;
    let height = h.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Re-encodes raster images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageConverter;

impl ImageConverter {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous re-encode; CPU bound, run it off the async pool.
    ///
    /// Decode and encode failures come back as [`AppError::ImageProcessing`].
    pub fn reencode(
        data: &[u8],
        format: RasterFormat,
        quality: u8,
        bounds: Option<(u32, u32)>,
    ) -> Result<Bytes, AppError> {
        let mut img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                AppError::ImageProcessing(format!("Failed to decode source image: {}", e))
            })?;

        if let Some((max_w, max_h)) = bounds {
            let (width, height) = img.dimensions();
            if width > max_w || height > max_h {
                tracing::debug!(width, height, max_w, max_h, "Resizing to fit resolution");
                img = img.resize(max_w, max_h, FilterType::Lanczos3);
            }
        }

        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity((width * height * 3) as usize);

        match format {
            RasterFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
                DynamicImage::ImageRgb8(img.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(format, e))?;
            }
            RasterFormat::Gif => {
                DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_to(&mut Cursor::new(&mut buffer), format.to_image_format())
                    .map_err(|e| encode_error(format, e))?;
            }
            RasterFormat::Png | RasterFormat::WebP => {
                img.write_to(&mut Cursor::new(&mut buffer), format.to_image_format())
                    .map_err(|e| encode_error(format, e))?;
            }
        }

        Ok(Bytes::from(buffer))
    }
}

fn encode_error(format: RasterFormat, err: image::ImageError) -> AppError {
    AppError::ImageProcessing(format!("Failed to encode {}: {}", format.extension(), err))
}

#[async_trait]
impl Converter for ImageConverter {
    async fn convert(
        &self,
        input: &RawFile,
        settings: &ConversionSettings,
    ) -> anyhow::Result<ConvertedBytes> {
        let format = RasterFormat::parse(&settings.format)
            .map_err(|_| AppError::UnsupportedFormat(settings.format.clone()))?;
        let quality = settings.effective_quality();
        let bounds = match settings.resolution.as_deref() {
            Some(res) => {
                let parsed = parse_resolution(res);
                if parsed.is_none() {
                    tracing::debug!(resolution = %res, "Ignoring unparseable resolution");
                }
                parsed
            }
            None => None,
        };

        let data = input.data.bytes().clone();
        // Image decode and encode are CPU-bound; run off the async pool.
        let out = tokio::task::spawn_blocking(move || {
            ImageConverter::reencode(&data, format, quality, bounds)
        })
        .await??;

        tracing::debug!(
            name = %input.name,
            format = format.extension(),
            quality,
            input_bytes = input.size_bytes,
            output_bytes = out.len(),
            "Image re-encoded"
        );

        Ok(ConvertedBytes {
            data: out,
            mime_type: format.to_mime_type().to_string(),
        })
    }
}

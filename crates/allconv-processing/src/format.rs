//! Target format identifiers
//!
//! Settings carry the target format as a free string. Raster formats the image encoder can
//! write are parsed into [`RasterFormat`]; every other identifier is still mapped to a mime
//! type so pass-through artifacts are labelled consistently.

use anyhow::{anyhow, Result};

/// Raster formats the image re-encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl RasterFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(RasterFormat::Jpeg),
            "png" => Ok(RasterFormat::Png),
            "webp" => Ok(RasterFormat::WebP),
            "gif" => Ok(RasterFormat::Gif),
            _ => Err(anyhow!("Invalid raster format: {}", s)),
        }
    }

    pub fn all() -> [RasterFormat; 4] {
        [
            RasterFormat::Jpeg,
            RasterFormat::Png,
            RasterFormat::WebP,
            RasterFormat::Gif,
        ]
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Png => "png",
            RasterFormat::WebP => "webp",
            RasterFormat::Gif => "gif",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Png => "image/png",
            RasterFormat::WebP => "image/webp",
            RasterFormat::Gif => "image/gif",
        }
    }

    #[cfg(feature = "image")]
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
            RasterFormat::Png => image::ImageFormat::Png,
            RasterFormat::WebP => image::ImageFormat::WebP,
            RasterFormat::Gif => image::ImageFormat::Gif,
        }
    }
}

/// Mime type implied by a target format identifier.
pub fn mime_for_format(format: &str) -> String {
    if let Ok(raster) = RasterFormat::parse(format) {
        return raster.to_mime_type().to_string();
    }

    let format = format.trim().trim_start_matches('.').to_lowercase();
    let mime = match format.as_str() {
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

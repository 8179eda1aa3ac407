//! allconv processing library
//!
//! Collaborators the conversion session depends on: conversion backends, download
//! delivery, and the registry that backs preview and download references.

pub mod converter;
pub mod delivery;
pub mod format;
#[cfg(feature = "image")]
pub mod raster;
pub mod registry;

pub use converter::{ConvertedBytes, Converter, PassthroughConverter, RoutingConverter};
pub use delivery::{sanitize_filename, Delivery, DownloadSink, LocalDirectorySink};
pub use format::{mime_for_format, RasterFormat};
#[cfg(feature = "image")]
pub use raster::ImageConverter;
pub use registry::{Resource, ResourceRegistry};

/// Default backend: image re-encoding for `image/*`, pass-through for everything else.
#[cfg(feature = "image")]
pub fn default_converter() -> std::sync::Arc<dyn Converter> {
    std::sync::Arc::new(RoutingConverter::new(
        std::sync::Arc::new(ImageConverter::new()),
        std::sync::Arc::new(PassthroughConverter::new()),
    ))
}

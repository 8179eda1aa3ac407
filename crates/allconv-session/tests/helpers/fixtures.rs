//! Test fixtures: raw files for the queue.

use allconv_core::RawFile;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Valid PNG of the given dimensions.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode test PNG");
    out.into_inner()
}

pub fn png_file(name: &str) -> RawFile {
    RawFile::new(name, "image/png", create_test_png(4, 4))
}

/// Non-image payload of `size` bytes.
pub fn video_file(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "video/mp4", vec![0u8; size])
}

pub fn png_files(names: &[&str]) -> Vec<RawFile> {
    names.iter().map(|n| png_file(n)).collect()
}

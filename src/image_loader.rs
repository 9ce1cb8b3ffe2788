// Image loading module
// Handles reading and decoding of the overlay image

use crate::error::{OverlayError, Result};
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// File extensions offered by the open dialog
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Decoded image kept for the lifetime of one "open"
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Load an image file and convert it to RGBA
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let data = fs::read(path).map_err(|source| OverlayError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Magic bytes win, the extension is only a fallback
    let format = match image::guess_format(&data) {
        Ok(format) => format,
        Err(source) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(format_from_extension)
            .ok_or_else(|| OverlayError::Format {
                path: path.to_path_buf(),
                source,
            })?,
    };

    let img = image::load(Cursor::new(&data), format).map_err(|source| OverlayError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SourceImage::new(img.to_rgba8()))
}

/// Get the image format for a file extension the dialog accepts
pub fn format_from_extension(ext: &str) -> Option<ImageFormat> {
    match ext.to_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

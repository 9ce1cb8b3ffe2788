// Error types
// Failures the overlay can recover from, plus the fatal startup ones

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// The image file could not be read from disk
    #[error("failed to read image file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file contents are not a recognised image format
    #[error("failed to detect image format of {}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The format was recognised but the pixels could not be decoded
    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("this program only works on Windows")]
    UnsupportedPlatform,

    /// The window did not expose a native Win32 handle
    #[error("window has no native Win32 handle")]
    WindowHandle,
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;

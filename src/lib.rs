// image-overlay - An always-on-top, semi-transparent image overlay for Windows
// Shows one image stretched to the window, with adjustable opacity and click-through

pub mod app;
pub mod cli;
pub mod debounce;
pub mod error;
pub mod image_loader;
pub mod keymap;
pub mod platform;
pub mod render;
#[cfg(target_os = "windows")]
pub mod runner;

pub use app::{Opacity, Overlay};
pub use error::OverlayError;

/// Open the overlay and block until its window closes
#[cfg(target_os = "windows")]
pub fn run(settings: cli::Settings) -> anyhow::Result<()> {
    platform::enable_dpi_awareness();
    runner::run(settings)
}

#[cfg(not(target_os = "windows"))]
pub fn run(_settings: cli::Settings) -> anyhow::Result<()> {
    Err(OverlayError::UnsupportedPlatform.into())
}

// image-overlay - An always-on-top, semi-transparent image overlay for Windows
// Right-click to open an image, Up/Down for opacity, Ctrl+T for click-through

use anyhow::Result;
use image_overlay::{cli, platform};
use log::info;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Refuse to start before any window exists on an unsupported OS
    platform::ensure_supported()?;

    let settings = cli::parse_args();

    info!(
        "Starting image-overlay with image: {:?}, opacity: {}",
        settings.image_path, settings.opacity
    );

    image_overlay::run(settings)
}

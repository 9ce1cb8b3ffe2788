// Command line interface module
// All arguments are optional: with none, the overlay opens empty with its prompt

use crate::app::Opacity;
use clap::Parser;
use std::path::PathBuf;

/// image-overlay - An always-on-top, semi-transparent image overlay
#[derive(Parser, Debug)]
#[command(name = "image-overlay")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Image to show at startup (right-click the window to open another)
    #[arg(value_name = "IMAGE")]
    pub image_path: Option<PathBuf>,

    /// Initial window opacity (0.1 - 1.0), snapped to 0.05 steps
    #[arg(short, long, default_value = "1.0", value_parser = parse_opacity)]
    pub opacity: f32,

    /// Initial X position of the window
    #[arg(short = 'x', long, default_value = "100", allow_negative_numbers = true)]
    pub pos_x: i32,

    /// Initial Y position of the window
    #[arg(short = 'y', long, default_value = "100", allow_negative_numbers = true)]
    pub pos_y: i32,

    /// Initial canvas width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Initial canvas height in pixels
    #[arg(long, default_value = "600")]
    pub height: u32,
}

/// Resolved startup settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub image_path: Option<PathBuf>,
    pub opacity: Opacity,
    pub position: (i32, i32),
    pub size: (u32, u32),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_path: None,
            opacity: Opacity::default(),
            position: (100, 100),
            size: (800, 600),
        }
    }
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            image_path: args.image_path,
            opacity: Opacity::from_level(args.opacity),
            position: (args.pos_x, args.pos_y),
            size: (args.width.max(1), args.height.max(1)),
        }
    }
}

/// Parse opacity value and ensure it's within valid range
fn parse_opacity(s: &str) -> Result<f32, String> {
    let opacity: f32 = s.parse().map_err(|_| "Invalid opacity value")?;
    if !(0.1..=1.0).contains(&opacity) {
        return Err("Opacity must be between 0.1 and 1.0".to_string());
    }
    Ok(opacity)
}

/// Parse command line arguments into startup settings
pub fn parse_args() -> Settings {
    Args::parse().into()
}

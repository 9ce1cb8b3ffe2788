// Platform bridge
// Window alpha and click-through go through the host OS window-style API

use crate::error::{OverlayError, Result};

#[cfg(target_os = "windows")]
mod win32;

#[cfg(target_os = "windows")]
pub use win32::{enable_dpi_awareness, pick_image, GdiPresenter, Win32Controller};

/// Title the overlay window is created with and looked up by
pub const WINDOW_TITLE: &str = "ImageOverlay";

/// `WS_EX_LAYERED`: the window is alpha-blended by the compositor
pub const LAYERED_BIT: isize = 0x0008_0000;
/// `WS_EX_TRANSPARENT`: mouse input falls through to the windows below
pub const TRANSPARENT_BIT: isize = 0x0000_0020;

/// OS capability for whole-window alpha and input pass-through.
///
/// Implementations assume the calls succeed. When the window cannot be
/// found they do nothing.
pub trait WindowTransparencyController {
    /// Apply a whole-window opacity in `0.0..=1.0`
    fn apply_opacity(&mut self, opacity: f32);

    /// Make the window transparent to mouse input, or take input again
    fn set_click_through(&mut self, enabled: bool);
}

/// Controller for platforms without a window-style API: every call is a no-op
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopController;

impl WindowTransparencyController for NoopController {
    fn apply_opacity(&mut self, _opacity: f32) {}

    fn set_click_through(&mut self, _enabled: bool) {}
}

/// Compute the extended style word after toggling click-through.
///
/// Enabling sets both the layered and transparent bits. Disabling clears the
/// transparent bit only, the window stays layered so its alpha survives.
pub fn click_through_style(style: isize, enabled: bool) -> isize {
    if enabled {
        style | LAYERED_BIT | TRANSPARENT_BIT
    } else {
        (style & !TRANSPARENT_BIT) | LAYERED_BIT
    }
}

/// Fail early when the host OS has no window-style API we can drive
pub fn ensure_supported() -> Result<()> {
    if cfg!(target_os = "windows") {
        Ok(())
    } else {
        Err(OverlayError::UnsupportedPlatform)
    }
}

// Win32 implementation of the platform bridge
// Extended window styles, layered alpha, GDI presentation and the open dialog

use super::{click_through_style, WindowTransparencyController, LAYERED_BIT, WINDOW_TITLE};
use crate::error::{OverlayError, Result};
use crate::image_loader::SUPPORTED_EXTENSIONS;
use crate::render::Frame;
use log::{debug, warn};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use std::ffi::c_void;
use std::mem;
use std::path::PathBuf;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    FillRect, GetDC, GetStockObject, ReleaseDC, SetDIBitsToDevice, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBRUSH, WHITE_BRUSH,
};
use windows::Win32::UI::HiDpi::{SetProcessDpiAwareness, PROCESS_SYSTEM_DPI_AWARE};
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, GetWindowLongPtrW, SetLayeredWindowAttributes, SetWindowLongPtrW, GWL_EXSTYLE,
    LWA_ALPHA,
};
use winit::window::Window;

fn widestring(value: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(value)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Drives the overlay's extended window styles, found by exact window title
pub struct Win32Controller {
    title: Vec<u16>,
}

impl Win32Controller {
    pub fn new() -> Self {
        Self {
            title: widestring(WINDOW_TITLE),
        }
    }

    fn find_window(&self) -> Option<HWND> {
        let hwnd = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(self.title.as_ptr())) }.ok()?;
        if hwnd.is_invalid() {
            None
        } else {
            Some(hwnd)
        }
    }
}

impl Default for Win32Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTransparencyController for Win32Controller {
    fn apply_opacity(&mut self, opacity: f32) {
        let Some(hwnd) = self.find_window() else {
            debug!("Overlay window not found, opacity not applied");
            return;
        };

        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            // Layered alpha is ignored until the window carries WS_EX_LAYERED
            let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            if style & LAYERED_BIT == 0 {
                let _ = SetWindowLongPtrW(hwnd, GWL_EXSTYLE, style | LAYERED_BIT);
            }
            if let Err(e) = SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA) {
                warn!("SetLayeredWindowAttributes failed: {}", e);
            }
        }
    }

    fn set_click_through(&mut self, enabled: bool) {
        let Some(hwnd) = self.find_window() else {
            debug!("Overlay window not found, click-through unchanged");
            return;
        };

        unsafe {
            let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            let _ = SetWindowLongPtrW(hwnd, GWL_EXSTYLE, click_through_style(style, enabled));
        }
    }
}

/// Ask for system DPI awareness so the window is not bitmap-stretched
pub fn enable_dpi_awareness() {
    if let Err(e) = unsafe { SetProcessDpiAwareness(PROCESS_SYSTEM_DPI_AWARE) } {
        // Already set by a manifest or an earlier call
        debug!("SetProcessDpiAwareness: {}", e);
    }
}

/// Show the native open dialog, filtered to the formats we decode.
/// Blocks the event loop until the user answers.
pub fn pick_image(parent: &Window) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open image")
        .add_filter("Image files", SUPPORTED_EXTENSIONS)
        .set_parent(parent)
        .pick_file()
}

/// Copies frames into the window's client area with GDI
pub struct GdiPresenter {
    hwnd: HWND,
}

impl GdiPresenter {
    pub fn new(window: &Window) -> Result<Self> {
        let handle = window
            .window_handle()
            .map_err(|_| OverlayError::WindowHandle)?;
        match handle.as_raw() {
            RawWindowHandle::Win32(handle) => Ok(Self {
                hwnd: HWND(handle.hwnd.get() as *mut c_void),
            }),
            _ => Err(OverlayError::WindowHandle),
        }
    }

    /// Draw `frame` at the top-left corner and clear the rest of the client area
    pub fn present(&self, frame: &Frame, client_width: u32, client_height: u32) {
        unsafe {
            let hdc = GetDC(self.hwnd);
            if hdc.is_invalid() {
                warn!("GetDC failed, frame dropped");
                return;
            }

            let brush = HBRUSH(GetStockObject(WHITE_BRUSH).0);
            let (fw, fh) = (frame.width(), frame.height());
            if client_width > fw {
                let right = RECT {
                    left: fw as i32,
                    top: 0,
                    right: client_width as i32,
                    bottom: client_height as i32,
                };
                let _ = FillRect(hdc, &right, brush);
            }
            if client_height > fh {
                let bottom = RECT {
                    left: 0,
                    top: fh as i32,
                    right: fw.min(client_width) as i32,
                    bottom: client_height as i32,
                };
                let _ = FillRect(hdc, &bottom, brush);
            }

            if fw > 0 && fh > 0 {
                let mut bmi = BITMAPINFO::default();
                bmi.bmiHeader = BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: fw as i32,
                    // Negative height: rows are stored top-down
                    biHeight: -(fh as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                };
                let _ = SetDIBitsToDevice(
                    hdc,
                    0,
                    0,
                    fw,
                    fh,
                    0,
                    0,
                    0,
                    fh,
                    frame.pixels().as_ptr() as *const c_void,
                    &bmi,
                    DIB_RGB_COLORS,
                );
            }

            let _ = ReleaseDC(self.hwnd, hdc);
        }
    }
}

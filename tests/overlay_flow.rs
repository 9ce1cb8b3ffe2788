use image::{Rgba, RgbaImage};
use image_overlay::debounce::RESIZE_DEBOUNCE;
use image_overlay::platform::{click_through_style, WindowTransparencyController, LAYERED_BIT};
use image_overlay::{Opacity, Overlay};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Stands in for the OS: keeps an extended style word and the last alpha
struct FakeWindow {
    style: isize,
    alpha: Option<f32>,
}

impl FakeWindow {
    fn new() -> Self {
        Self {
            style: 0x0000_0100,
            alpha: None,
        }
    }
}

impl WindowTransparencyController for FakeWindow {
    fn apply_opacity(&mut self, opacity: f32) {
        self.style |= LAYERED_BIT;
        self.alpha = Some(opacity);
    }

    fn set_click_through(&mut self, enabled: bool) {
        self.style = click_through_style(self.style, enabled);
    }
}

fn write_png(dir: &tempfile::TempDir, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.path().join(name);
    RgbaImage::from_fn(w, h, |x, _| {
        if x < w / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
    .save(&path)
    .unwrap();
    path
}

fn started() -> Overlay<FakeWindow> {
    let mut overlay = Overlay::new(FakeWindow::new(), Opacity::default(), (800, 600));
    overlay.apply_window_attributes();
    overlay
}

#[test]
fn open_resize_and_fade() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(&dir, "overlay.png", 400, 300);
    let mut overlay = started();
    assert!(overlay.prompt_visible());

    // Right-click, pick the PNG
    assert!(overlay.open_image(&png));
    assert!(!overlay.prompt_visible());
    let frame = overlay.rendered().unwrap();
    assert_eq!((frame.width(), frame.height()), (800, 600));
    // Stretched, not letterboxed: both edges carry image colour
    assert_eq!(frame.pixel(0, 0), Some(0x00_FF_00_00));
    assert_eq!(frame.pixel(799, 599), Some(0x00_00_00_FF));

    // Drag the window edge, then let it settle
    let t0 = Instant::now();
    for step in 0..20u32 {
        let now = t0 + Duration::from_millis(step as u64 * 15);
        overlay.poll_resize(now);
        overlay.on_resize(800 + step * 10, 600 + step * 5, now);
    }
    assert_eq!(overlay.render_count(), 1);
    let last = t0 + Duration::from_millis(19 * 15);
    assert!(overlay.poll_resize(last + RESIZE_DEBOUNCE));
    assert_eq!(overlay.render_count(), 2);
    let frame = overlay.rendered().unwrap();
    assert_eq!((frame.width(), frame.height()), (990, 695));

    for _ in 0..5 {
        overlay.decrease_opacity();
    }
    assert_eq!(overlay.opacity().percent(), 75);
    assert_eq!(overlay.controller().alpha, Some(0.75));
}

#[test]
fn bad_file_keeps_previous_image() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_png(&dir, "good.png", 40, 30);
    let bad = dir.path().join("bad.jpg");
    std::fs::write(&bad, b"\xFF\xD8\xFF not really a jpeg").unwrap();

    let mut overlay = started();
    assert!(!overlay.open_image(&bad));
    assert!(overlay.prompt_visible());

    assert!(overlay.open_image(&good));
    let before = overlay.rendered().cloned();
    assert!(!overlay.open_image(&bad));
    assert!(!overlay.open_image(&dir.path().join("missing.png")));
    assert_eq!(overlay.rendered().cloned(), before);
    assert_eq!(overlay.source().map(|s| s.width()), Some(40));
}

#[test]
fn click_through_round_trip_restores_style() {
    let mut overlay = started();
    let original = overlay.controller().style;

    overlay.toggle_click_through();
    assert_ne!(overlay.controller().style, original);
    overlay.toggle_click_through();
    assert_eq!(overlay.controller().style, original);
}

#[test]
fn opening_a_new_image_replaces_the_old_one() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_png(&dir, "first.png", 40, 30);
    let second = write_png(&dir, "second.png", 8, 8);

    let mut overlay = started();
    overlay.on_resize(120, 90, Instant::now());
    assert!(overlay.open_image(&first));
    assert!(overlay.open_image(&second));
    assert_eq!(overlay.source().map(|s| (s.width(), s.height())), Some((8, 8)));
    let frame = overlay.rendered().unwrap();
    assert_eq!((frame.width(), frame.height()), (120, 90));
}

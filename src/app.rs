// Application state module
// The overlay window's state and handlers, independent of the windowing toolkit

use crate::debounce::Debouncer;
use crate::image_loader::{self, SourceImage};
use crate::platform::WindowTransparencyController;
use crate::render::{self, Frame};
use log::{debug, error, info};
use std::fmt;
use std::path::Path;
use std::time::Instant;

const OPACITY_MIN_PERCENT: u32 = 10;
const OPACITY_MAX_PERCENT: u32 = 100;
const OPACITY_STEP_PERCENT: u32 = 5;

/// Whole-window opacity, kept in hundredths so repeated steps never drift.
/// Always within 0.10..=1.00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Opacity(u32);

impl Opacity {
    pub const MIN: Opacity = Opacity(OPACITY_MIN_PERCENT);
    pub const MAX: Opacity = Opacity(OPACITY_MAX_PERCENT);

    /// Snap a level in `0.0..=1.0` to the nearest 0.05 step inside the valid range
    pub fn from_level(level: f32) -> Self {
        let steps = (level * 20.0).round() as i64;
        let percent = (steps * OPACITY_STEP_PERCENT as i64)
            .clamp(OPACITY_MIN_PERCENT as i64, OPACITY_MAX_PERCENT as i64);
        Opacity(percent as u32)
    }

    pub fn percent(self) -> u32 {
        self.0
    }

    pub fn level(self) -> f32 {
        self.0 as f32 / 100.0
    }

    pub fn increased(self) -> Self {
        Opacity((self.0 + OPACITY_STEP_PERCENT).min(OPACITY_MAX_PERCENT))
    }

    pub fn decreased(self) -> Self {
        Opacity(self.0.saturating_sub(OPACITY_STEP_PERCENT).max(OPACITY_MIN_PERCENT))
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.level())
    }
}

/// Main overlay state: one image, one opacity, one click-through flag
pub struct Overlay<C> {
    controller: C,
    /// The decoded image, `None` while the prompt is showing
    source: Option<SourceImage>,
    /// The source resampled to the canvas size of the last render
    rendered: Option<Frame>,
    opacity: Opacity,
    click_through: bool,
    /// Latest canvas size reported by the toolkit
    canvas: (u32, u32),
    resize: Debouncer,
    render_count: u64,
}

impl<C: WindowTransparencyController> Overlay<C> {
    pub fn new(controller: C, opacity: Opacity, canvas: (u32, u32)) -> Self {
        Self {
            controller,
            source: None,
            rendered: None,
            opacity,
            click_through: false,
            canvas,
            resize: Debouncer::default(),
            render_count: 0,
        }
    }

    /// Push the current opacity to the window; called once it exists
    pub fn apply_window_attributes(&mut self) {
        self.controller.apply_opacity(self.opacity.level());
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    pub fn is_click_through(&self) -> bool {
        self.click_through
    }

    pub fn prompt_visible(&self) -> bool {
        self.source.is_none()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn rendered(&self) -> Option<&Frame> {
        self.rendered.as_ref()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    /// Number of resamples performed so far
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// When the debounced re-render is due, if one is pending
    pub fn pending_render(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Load an image from disk. On failure the error is logged and the
    /// previous image (or the prompt) stays as it was.
    pub fn open_image(&mut self, path: &Path) -> bool {
        match image_loader::load_image(path) {
            Ok(image) => {
                info!(
                    "Image loaded: {}x{} pixels from {}",
                    image.width(),
                    image.height(),
                    path.display()
                );
                self.set_image(image);
                true
            }
            Err(e) => {
                error!("Failed to load image: {:#}", anyhow::Error::from(e));
                false
            }
        }
    }

    /// Replace the source image, hide the prompt and render at the current canvas size.
    /// The previous frame stays on screen if the canvas is too small to render into.
    pub fn set_image(&mut self, image: SourceImage) {
        self.source = Some(image);
        let (width, height) = self.canvas;
        self.render(width, height);
    }

    /// Resample the source to exactly `width` x `height` and reapply the opacity.
    /// Skipped when nothing is loaded or the canvas is degenerate.
    pub fn render(&mut self, width: u32, height: u32) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };

        let started = Instant::now();
        let Some(frame) = render::resample(source, width, height) else {
            debug!("Canvas {}x{} too small, render skipped", width, height);
            return false;
        };
        debug!(
            "Rendered {}x{} -> {}x{} in {:?}",
            source.width(),
            source.height(),
            width,
            height,
            started.elapsed()
        );

        self.rendered = Some(frame);
        self.render_count += 1;
        self.controller.apply_opacity(self.opacity.level());
        true
    }

    /// Record a canvas size change and (re)schedule the debounced render
    pub fn on_resize(&mut self, width: u32, height: u32, now: Instant) {
        self.canvas = (width, height);
        if self.source.is_none() {
            return;
        }
        debug!("Canvas resized to {}x{}, render deferred", width, height);
        self.resize.schedule(now);
    }

    /// Run the deferred render if its deadline has passed.
    /// Uses the canvas size at this moment, not the one at scheduling time.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        if !self.resize.fire_if_due(now) {
            return false;
        }
        let (width, height) = self.canvas;
        self.render(width, height)
    }

    pub fn increase_opacity(&mut self) {
        self.set_opacity(self.opacity.increased());
    }

    pub fn decrease_opacity(&mut self) {
        self.set_opacity(self.opacity.decreased());
    }

    fn set_opacity(&mut self, opacity: Opacity) {
        if opacity != self.opacity {
            self.opacity = opacity;
            info!("Opacity adjusted to: {}", self.opacity);
        }
        self.controller.apply_opacity(self.opacity.level());
    }

    /// Flip click-through mode and return the new state
    pub fn toggle_click_through(&mut self) -> bool {
        self.click_through = !self.click_through;
        self.controller.set_click_through(self.click_through);
        info!(
            "Pass-through {}",
            if self.click_through { "enabled" } else { "disabled" }
        );
        self.click_through
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::RESIZE_DEBOUNCE;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        opacity: Vec<f32>,
        click_through: Vec<bool>,
    }

    impl WindowTransparencyController for Recorder {
        fn apply_opacity(&mut self, opacity: f32) {
            self.opacity.push(opacity);
        }

        fn set_click_through(&mut self, enabled: bool) {
            self.click_through.push(enabled);
        }
    }

    fn overlay() -> Overlay<Recorder> {
        Overlay::new(Recorder::default(), Opacity::default(), (800, 600))
    }

    fn checker() -> SourceImage {
        SourceImage::new(RgbaImage::from_fn(40, 30, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }))
    }

    #[test]
    fn opacity_walks_in_steps_and_clamps() {
        let mut o = Opacity::default();
        assert_eq!(o.percent(), 100);
        assert_eq!(o.increased(), Opacity::MAX);

        for expected in (10..=95).rev().step_by(5) {
            o = o.decreased();
            assert_eq!(o.percent(), expected);
        }
        assert_eq!(o, Opacity::MIN);
        assert_eq!(o.decreased(), Opacity::MIN);
        assert_eq!(o.increased().percent(), 15);
    }

    #[test]
    fn opacity_from_level_snaps_and_clamps() {
        assert_eq!(Opacity::from_level(0.73).percent(), 75);
        assert_eq!(Opacity::from_level(0.0).percent(), 10);
        assert_eq!(Opacity::from_level(3.0).percent(), 100);
        assert_eq!(Opacity::from_level(f32::NAN).percent(), 10);
        assert_eq!(Opacity::from_level(0.35).to_string(), "0.35");
    }

    #[test]
    fn opacity_changes_reach_the_window() {
        let mut ov = overlay();
        ov.decrease_opacity();
        ov.decrease_opacity();
        ov.increase_opacity();
        assert_eq!(ov.opacity().percent(), 95);
        assert_eq!(ov.controller().opacity, vec![0.95, 0.9, 0.95]);
        assert_eq!(ov.render_count(), 0);
    }

    #[test]
    fn mixed_sequences_stay_in_range() {
        let mut ov = overlay();
        let pattern = [false, false, true, false, false, false, true, true, true, true];
        for round in 0..40 {
            for &up in &pattern {
                if up ^ (round % 3 == 0) {
                    ov.increase_opacity();
                } else {
                    ov.decrease_opacity();
                }
                let level = ov.opacity().level();
                assert!((0.1..=1.0).contains(&level), "{level}");
                assert_eq!(ov.opacity().percent() % 5, 0);
            }
        }
    }

    #[test]
    fn starts_with_prompt_and_nothing_rendered() {
        let ov = overlay();
        assert!(ov.prompt_visible());
        assert!(ov.rendered().is_none());
        assert!(!ov.is_click_through());
        assert!(ov.pending_render().is_none());
    }

    #[test]
    fn set_image_renders_at_canvas_size() {
        let mut ov = overlay();
        ov.set_image(checker());
        assert!(!ov.prompt_visible());
        let frame = ov.rendered().unwrap();
        assert_eq!((frame.width(), frame.height()), (800, 600));
        assert_eq!(ov.render_count(), 1);
        // Rendering reapplies the current opacity
        assert_eq!(ov.controller().opacity, vec![1.0]);
    }

    #[test]
    fn render_without_image_is_a_no_op() {
        let mut ov = overlay();
        assert!(!ov.render(100, 100));
        assert!(ov.controller().opacity.is_empty());
    }

    #[test]
    fn tiny_canvas_skips_render() {
        let mut ov = overlay();
        ov.set_image(checker());
        let before = ov.rendered().cloned();

        assert!(!ov.render(1, 400));
        assert!(!ov.render(400, 1));
        assert!(!ov.render(0, 0));
        assert_eq!(ov.rendered().cloned(), before);
        assert_eq!(ov.render_count(), 1);
    }

    #[test]
    fn new_image_on_tiny_canvas_keeps_old_frame() {
        let mut ov = overlay();
        ov.set_image(checker());
        let before = ov.rendered().cloned();
        assert!(before.is_some());

        ov.on_resize(1, 1, Instant::now());
        ov.set_image(SourceImage::new(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))));
        assert_eq!(ov.source().map(|s| s.width()), Some(8));
        assert_eq!(ov.rendered().cloned(), before);
        assert_eq!(ov.render_count(), 1);
    }

    #[test]
    fn resize_burst_renders_once_with_last_size() {
        let t0 = Instant::now();
        let mut ov = overlay();
        ov.set_image(checker());

        let sizes = [(810, 600), (830, 610), (860, 640), (900, 700), (1024, 768)];
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let now = t0 + Duration::from_millis(i as u64 * 10);
            assert!(!ov.poll_resize(now));
            ov.on_resize(w, h, now);
        }
        let last = t0 + Duration::from_millis(40);

        assert!(!ov.poll_resize(last + Duration::from_millis(49)));
        assert!(ov.poll_resize(last + RESIZE_DEBOUNCE));
        assert!(!ov.poll_resize(last + Duration::from_secs(1)));

        assert_eq!(ov.render_count(), 2);
        let frame = ov.rendered().unwrap();
        assert_eq!((frame.width(), frame.height()), (1024, 768));
    }

    #[test]
    fn deferred_render_uses_size_at_fire_time() {
        let t0 = Instant::now();
        let mut ov = overlay();
        ov.set_image(checker());
        ov.on_resize(300, 200, t0);
        assert_eq!(ov.pending_render(), Some(t0 + RESIZE_DEBOUNCE));

        assert!(ov.poll_resize(t0 + RESIZE_DEBOUNCE));
        assert_eq!(ov.rendered().unwrap().width(), 300);
    }

    #[test]
    fn resize_without_image_only_tracks_size() {
        let t0 = Instant::now();
        let mut ov = overlay();
        ov.on_resize(640, 480, t0);
        assert_eq!(ov.canvas_size(), (640, 480));
        assert!(ov.pending_render().is_none());
        assert!(!ov.poll_resize(t0 + Duration::from_secs(1)));

        ov.set_image(checker());
        assert_eq!(ov.rendered().unwrap().width(), 640);
    }

    #[test]
    fn click_through_toggles_and_reports() {
        let mut ov = overlay();
        assert!(ov.toggle_click_through());
        assert!(!ov.toggle_click_through());
        assert_eq!(ov.controller().click_through, vec![true, false]);
    }

    #[test]
    fn failed_open_keeps_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut ov = overlay();
        assert!(!ov.open_image(&dir.path().join("missing.png")));
        assert!(ov.prompt_visible());
        assert!(ov.rendered().is_none());
    }

    #[test]
    fn apply_window_attributes_pushes_initial_opacity() {
        let mut ov = Overlay::new(Recorder::default(), Opacity::from_level(0.6), (10, 10));
        ov.apply_window_attributes();
        assert_eq!(ov.controller().opacity, vec![0.6]);
    }
}

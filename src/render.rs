// Rendering module
// Builds the pixel frames shown in the window: the resampled image or the prompt

use crate::image_loader::SourceImage;
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Canvas background, visible through transparent image pixels
pub const BACKGROUND: u32 = 0x00_FF_FF_FF;

/// Smallest canvas edge worth resampling to
pub const MIN_RENDER_EXTENT: u32 = 2;

pub const PROMPT_TEXT: &str = "Right-click to open (PNG or JPEG)";
const PROMPT_FONT: &str = "Segoe UI";
/// 15pt at 96 dpi
const PROMPT_FONT_PX: f32 = 20.0;
const PROMPT_LINE_PX: f32 = 26.0;

/// Top-down pixel buffer, one `0x00RRGGBB` word per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Frame {
    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Alpha-blend a solid rectangle, clipped to the frame
    fn blend_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x.saturating_add(w as i32)).clamp(0, self.width as i32) as u32;
        let y1 = (y.saturating_add(h as i32)).clamp(0, self.height as i32) as u32;
        let alpha = color.a() as u32;
        if alpha == 0 {
            return;
        }

        for py in y0..y1 {
            let row = py as usize * self.width as usize;
            for px in x0..x1 {
                let dst = &mut self.pixels[row + px as usize];
                let old = *dst;
                let mix = |shift: u32, src: u8| -> u32 {
                    let d = (old >> shift) & 0xFF;
                    (src as u32 * alpha + d * (255 - alpha) + 127) / 255
                };
                *dst = (mix(16, color.r()) << 16) | (mix(8, color.g()) << 8) | mix(0, color.b());
            }
        }
    }
}

/// Scale colour by alpha so fully transparent pixels carry no colour into the filter
fn premultiply(source: &RgbaImage) -> RgbaImage {
    let mut out = source.clone();
    for Rgba([r, g, b, a]) in out.pixels_mut() {
        let alpha = *a as u32;
        for c in [r, g, b] {
            *c = ((*c as u32 * alpha + 127) / 255) as u8;
        }
    }
    out
}

/// Composite one premultiplied pixel over the white canvas background
fn over_background(Rgba([r, g, b, a]): Rgba<u8>) -> u32 {
    let uncovered = 255 - a as u32;
    let blend = |c: u8| -> u32 { (c as u32 + uncovered).min(255) };
    (blend(r) << 16) | (blend(g) << 8) | blend(b)
}

/// Stretch the source image to exactly `width` x `height`.
///
/// Aspect ratio is not preserved. Returns `None` when either edge is below
/// [`MIN_RENDER_EXTENT`], in which case no resampling happens at all.
pub fn resample(source: &SourceImage, width: u32, height: u32) -> Option<Frame> {
    if width < MIN_RENDER_EXTENT || height < MIN_RENDER_EXTENT {
        return None;
    }

    let premultiplied = premultiply(source.pixels());
    let resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);
    let pixels = resized.pixels().map(|p| over_background(*p)).collect();

    Some(Frame {
        width,
        height,
        pixels,
    })
}

/// Rasterises the "open an image" prompt centred on a blank canvas
pub struct PromptPainter {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl PromptPainter {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    /// Paint the prompt for a canvas of the given size and DPI scale factor
    pub fn paint(&mut self, width: u32, height: u32, scale: f64) -> Frame {
        let mut frame = Frame::filled(width, height, BACKGROUND);
        if width == 0 || height == 0 {
            return frame;
        }

        let scale = scale as f32;
        let metrics = Metrics::new(PROMPT_FONT_PX * scale, PROMPT_LINE_PX * scale);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(
            &mut self.font_system,
            PROMPT_TEXT,
            Attrs::new().family(Family::Name(PROMPT_FONT)),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let (text_w, text_h) = buffer
            .layout_runs()
            .fold((0.0f32, 0.0f32), |(w, h), run| {
                (w.max(run.line_w), h + metrics.line_height)
            });
        let origin_x = ((width as f32 - text_w) / 2.0).round() as i32;
        let origin_y = ((height as f32 - text_h) / 2.0).round() as i32;

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(0, 0, 0),
            |x, y, w, h, color| frame.blend_rect(origin_x + x, origin_y + y, w, h, color),
        );

        frame
    }
}

impl Default for PromptPainter {
    fn default() -> Self {
        Self::new()
    }
}

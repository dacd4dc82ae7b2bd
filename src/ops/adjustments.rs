// ============================================================================
// ADJUSTMENT OPERATIONS — whole-buffer pixel filters
// ============================================================================
//
// Every filter is a pure per-pixel transform; rows are processed in parallel
// via rayon. Alpha is always preserved.
// ============================================================================

use rayon::prelude::*;

use crate::canvas::PixelBuffer;

/// Whole-buffer filters, applied by the session and the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    /// Rec. 601 luma into R, G and B.
    Grayscale,
    /// 255 − channel for R, G and B.
    Invert,
    /// Both values in [-100, 100]; out-of-range input is clamped.
    BrightnessContrast { brightness: i32, contrast: i32 },
}

impl Filter {
    pub fn label(&self) -> &'static str {
        match self {
            Filter::Grayscale => "Grayscale",
            Filter::Invert => "Invert Colors",
            Filter::BrightnessContrast { .. } => "Brightness/Contrast",
        }
    }
}

// ============================================================================
// HELPER: per-pixel transform
// ============================================================================

/// Apply `transform` to every pixel. It receives (r, g, b) as f32 and
/// returns the new (r, g, b); results are rounded and clamped to 0..=255.
fn apply_pixel_transform<F>(buffer: &mut PixelBuffer, transform: F)
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32) + Sync,
{
    let stride = buffer.width() as usize * 4;
    let raw: &mut [u8] = buffer.pixels_mut();

    raw.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let (nr, ng, nb) = transform(px[0] as f32, px[1] as f32, px[2] as f32);
            px[0] = nr.round().clamp(0.0, 255.0) as u8;
            px[1] = ng.round().clamp(0.0, 255.0) as u8;
            px[2] = nb.round().clamp(0.0, 255.0) as u8;
        }
    });
    buffer.set_modified(true);
}

impl PixelBuffer {
    pub fn apply_filter(&mut self, filter: Filter) {
        match filter {
            Filter::Grayscale => grayscale(self),
            Filter::Invert => invert_colors(self),
            Filter::BrightnessContrast { brightness, contrast } => {
                brightness_contrast(self, brightness, contrast)
            }
        }
    }
}

pub fn grayscale(buffer: &mut PixelBuffer) {
    apply_pixel_transform(buffer, |r, g, b| {
        let l = 0.299 * r + 0.587 * g + 0.114 * b;
        (l, l, l)
    });
}

/// Invert all color channels (R, G, B). Alpha is preserved.
pub fn invert_colors(buffer: &mut PixelBuffer) {
    apply_pixel_transform(buffer, |r, g, b| (255.0 - r, 255.0 - g, 255.0 - b));
}

/// Brightness scales each channel by `(brightness + 100) / 100`; contrast
/// then scales the distance from mid-gray (128) by `(contrast + 100) / 100`.
pub fn brightness_contrast(buffer: &mut PixelBuffer, brightness: i32, contrast: i32) {
    let bf = (brightness.clamp(-100, 100) + 100) as f32 / 100.0;
    let cf = (contrast.clamp(-100, 100) + 100) as f32 / 100.0;
    apply_pixel_transform(buffer, move |r, g, b| {
        let adjust = |v: f32| {
            let v = (v * bf).clamp(0.0, 255.0);
            (v - 128.0) * cf + 128.0
        };
        (adjust(r), adjust(g), adjust(b))
    });
}

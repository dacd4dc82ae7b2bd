use std::fmt;

use image::{Rgba, RgbaImage};

use crate::error::{EditorError, EditorResult};

/// Straight (non-premultiplied) 8-bit RGBA.
pub type Color = Rgba<u8>;

pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);
pub const BLACK: Color = Rgba([0, 0, 0, 255]);

/// Upper bound on pixel count for a single buffer (~256 megapixels).
const MAX_PIXELS: u64 = 256_000_000;

// ============================================================================
// RECT – half-open axis-aligned rectangle in buffer coordinates
// ============================================================================

/// Axis-aligned rectangle covering `[x1, x2) × [y1, y2)`.
///
/// Constructors normalize the corners so `x1 <= x2` and `y1 <= y2` always hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Rectangle spanned by two drag points, in any order.
    pub fn from_points(a: (i32, i32), b: (i32, i32)) -> Self {
        Self::new(a.0, a.1, b.0, b.1)
    }

    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(x, y, x.saturating_add(width as i32), y.saturating_add(height as i32))
    }

    pub fn width(&self) -> u32 {
        (self.x2 as i64 - self.x1 as i64).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 as i64 - self.y1 as i64).max(0) as u32
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if r.is_empty() { None } else { Some(r) }
    }

    /// Clip to a `width × height` buffer. `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersect(&Rect::from_origin_size(0, 0, width, height))
    }

    /// Grow by `margin` on every side, saturating at the `i32` range.
    pub fn inflate(&self, margin: i32) -> Rect {
        Rect {
            x1: self.x1.saturating_sub(margin),
            y1: self.y1.saturating_sub(margin),
            x2: self.x2.saturating_add(margin),
            y2: self.y2.saturating_add(margin),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

// ============================================================================
// PIXEL BUFFER – the authoritative RGBA grid
// ============================================================================

/// Row-major RGBA pixel grid with the origin at the top-left.
///
/// Every read and write is bounds-checked against `[0, W) × [0, H)`;
/// out-of-bounds access is a no-op rather than a fault. Mutating calls set
/// the `modified` flag, which only `set_modified(false)` clears.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pixels: RgbaImage,
    modified: bool,
}

impl PixelBuffer {
    /// Allocate a `width × height` buffer filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> EditorResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            modified: false,
        })
    }

    /// Wrap an already-decoded image.
    pub fn from_rgba_image(pixels: RgbaImage) -> EditorResult<Self> {
        check_dimensions(pixels.width(), pixels.height())?;
        Ok(Self { pixels, modified: false })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(0, 0, self.width(), self.height())
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        if self.in_bounds(x, y) {
            Some(*self.pixels.get_pixel(x as u32, y as u32))
        } else {
            None
        }
    }

    /// Overwrite one pixel (no blending). Out of bounds is ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if self.in_bounds(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, color);
            self.modified = true;
        }
    }

    /// Overwrite every pixel of `rect` (clipped to the buffer) with `color`.
    pub fn fill_region(&mut self, rect: Rect, color: Color) {
        let Some(r) = rect.clamp_to(self.width(), self.height()) else { return };
        for y in r.y1..r.y2 {
            for x in r.x1..r.x2 {
                self.pixels.put_pixel(x as u32, y as u32, color);
            }
        }
        self.modified = true;
    }

    /// Read-only copy of the part of `rect` that lies inside the buffer.
    pub fn copy_region(&self, rect: Rect) -> Option<PixelBuffer> {
        let r = rect.clamp_to(self.width(), self.height())?;
        let sub = image::imageops::crop_imm(
            &self.pixels,
            r.x1 as u32,
            r.y1 as u32,
            r.width(),
            r.height(),
        )
        .to_image();
        Some(PixelBuffer { pixels: sub, modified: false })
    }

    /// Paste `source` with its top-left corner at `(x, y)`, using the source's
    /// own alpha channel as the mask: alpha 255 replaces, alpha 0 leaves the
    /// destination untouched, anything in between interpolates all four
    /// channels. Source pixels landing outside the buffer are skipped.
    pub fn composite_paste(&mut self, source: &PixelBuffer, x: i32, y: i32) {
        let target = Rect::from_origin_size(x, y, source.width(), source.height());
        let Some(r) = target.clamp_to(self.width(), self.height()) else { return };

        for dy in r.y1..r.y2 {
            for dx in r.x1..r.x2 {
                let src = *source.pixels.get_pixel((dx - x) as u32, (dy - y) as u32);
                let mask = src[3];
                if mask == 0 {
                    continue;
                }
                let dst = self.pixels.get_pixel_mut(dx as u32, dy as u32);
                *dst = mask_blend(*dst, src, mask);
            }
        }
        self.modified = true;
    }

    /// Pixel-for-pixel equality (dimensions and all four channels).
    /// The `modified` flag is not compared.
    pub fn same_pixels(&self, other: &PixelBuffer) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.pixels.as_raw() == other.pixels.as_raw()
    }

    /// Raw row-major RGBA bytes, e.g. for uploading to a display surface.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Mutable access for the drawing and filter operations in `ops`.
    /// Callers are responsible for setting the modified flag.
    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Write without bounds checks on the caller's side; still clipped here.
    /// Does not touch the modified flag (hot path for rasterizers).
    #[inline]
    pub(crate) fn put_unflagged(&mut self, x: i32, y: i32, color: Color) {
        if self.in_bounds(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Alpha-blend `color` over the pixel at `(x, y)` scaled by `coverage` (0..=1).
    #[inline]
    pub(crate) fn blend_unflagged(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let a = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
        if a == 0 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        *dst = over(*dst, Rgba([color[0], color[1], color[2], a]));
    }
}

/// 1×1 transparent stand-in, used while the real buffer is moved out.
impl Default for PixelBuffer {
    fn default() -> Self {
        Self {
            pixels: RgbaImage::from_pixel(1, 1, TRANSPARENT),
            modified: false,
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> EditorResult<()> {
    if width == 0 || height == 0 || (width as u64) * (height as u64) > MAX_PIXELS {
        return Err(EditorError::InvalidDimension { width, height });
    }
    Ok(())
}

/// Masked paste: every channel moves from `dst` toward `src` by `mask/255`.
#[inline]
fn mask_blend(dst: Color, src: Color, mask: u8) -> Color {
    if mask == 255 {
        return src;
    }
    let m = mask as u32;
    let inv = 255 - m;
    let mix = |s: u8, d: u8| ((s as u32 * m + d as u32 * inv + 127) / 255) as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        mix(src[3], dst[3]),
    ])
}

/// Porter-Duff "source over" on straight alpha.
#[inline]
fn over(dst: Color, src: Color) -> Color {
    if src[3] == 255 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let ch = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        ch(src[0], dst[0]),
        ch(src[1], dst[1]),
        ch(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

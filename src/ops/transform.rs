// ============================================================================
// TRANSFORM OPERATIONS — crop, resize, rotate
// ============================================================================
//
// All three produce a fresh buffer and leave `self` untouched, so the caller
// can swap the result in only on success.
// ============================================================================

use image::{Rgba, RgbaImage, imageops};
use rayon::prelude::*;

use crate::canvas::{PixelBuffer, Rect, TRANSPARENT};
use crate::error::{EditorError, EditorResult};

/// Angles closer than this to a multiple of 90° take the exact path.
const RIGHT_ANGLE_EPSILON: f64 = 1e-6;

impl PixelBuffer {
    /// Copy of the pixels inside `rect`, clipped to the buffer.
    pub fn crop(&self, rect: Rect) -> EditorResult<PixelBuffer> {
        let mut out = self
            .copy_region(rect)
            .ok_or(EditorError::InvalidRegion { rect })?;
        out.set_modified(true);
        Ok(out)
    }

    /// Lanczos3 resample to `new_w × new_h`.
    pub fn resize(&self, new_w: u32, new_h: u32) -> EditorResult<PixelBuffer> {
        if new_w == 0 || new_h == 0 {
            return Err(EditorError::InvalidDimension { width: new_w, height: new_h });
        }
        let resized = imageops::resize(self.as_rgba_image(), new_w, new_h, imageops::FilterType::Lanczos3);
        let mut out = PixelBuffer::from_rgba_image(resized)?;
        out.set_modified(true);
        Ok(out)
    }

    /// Rotate counter-clockwise by `angle_degrees` (negative = clockwise).
    ///
    /// The result is enlarged to hold the whole rotated image; uncovered
    /// corners are transparent. Multiples of 90° are exact pixel permutations.
    pub fn rotate(&self, angle_degrees: f64) -> PixelBuffer {
        let a = angle_degrees.rem_euclid(360.0);
        let quarter = (a / 90.0).round();
        let rotated = if (a - quarter * 90.0).abs() < RIGHT_ANGLE_EPSILON {
            match quarter as i32 % 4 {
                0 => self.as_rgba_image().clone(),
                // imageops rotates clockwise.
                1 => imageops::rotate270(self.as_rgba_image()),
                2 => imageops::rotate180(self.as_rgba_image()),
                _ => imageops::rotate90(self.as_rgba_image()),
            }
        } else {
            rotate_bilinear(self.as_rgba_image(), a.to_radians())
        };
        let mut out = match PixelBuffer::from_rgba_image(rotated) {
            Ok(buf) => buf,
            // Only reachable if the expanded canvas overflows the pixel cap.
            Err(_) => self.clone(),
        };
        out.set_modified(true);
        out
    }
}

/// Expand-to-fit rotation with bilinear sampling.
fn rotate_bilinear(src: &RgbaImage, theta: f64) -> RgbaImage {
    let (w, h) = (src.width() as f64, src.height() as f64);
    let (sin, cos) = theta.sin_cos();
    let new_w = ((w * cos.abs() + h * sin.abs()) - 1e-6).ceil().max(1.0) as u32;
    let new_h = ((w * sin.abs() + h * cos.abs()) - 1e-6).ceil().max(1.0) as u32;

    let (scx, scy) = (w / 2.0, h / 2.0);
    let (dcx, dcy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);
    let stride = new_w as usize * 4;
    let mut raw = vec![0u8; stride * new_h as usize];

    raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let dy = y as f64 + 0.5 - dcy;
        for x in 0..new_w as usize {
            let dx = x as f64 + 0.5 - dcx;
            // Inverse of a visual CCW rotation with y pointing down.
            let sx = dx * cos - dy * sin + scx - 0.5;
            let sy = dx * sin + dy * cos + scy - 0.5;
            let p = bilinear_sample(src, sx as f32, sy as f32);
            row[x * 4..x * 4 + 4].copy_from_slice(&p.0);
        }
    });

    RgbaImage::from_raw(new_w, new_h, raw)
        .unwrap_or_else(|| RgbaImage::from_pixel(new_w, new_h, TRANSPARENT))
}

/// Bilinear interpolation sampling; taps outside the image are transparent.
fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        if sx < 0 || sy < 0 || sx >= img.width() as i32 || sy >= img.height() as i32 {
            [0.0; 4]
        } else {
            let p = img.get_pixel(sx as u32, sy as u32);
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
        }
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn crop_clips_and_rejects_outside() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        buf.set_pixel(3, 4, RED);
        let out = buf.crop(Rect::new(3, 4, 13, 6)).unwrap();
        assert_eq!((out.width(), out.height()), (7, 2));
        assert_eq!(out.get_pixel(0, 0), Some(RED));
        assert!(out.is_modified());

        assert!(matches!(
            buf.crop(Rect::new(20, 20, 30, 30)),
            Err(EditorError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn resize_round_trip_keeps_dimensions() {
        let buf = PixelBuffer::new(100, 100, RED).unwrap();
        let small = buf.resize(50, 50).unwrap();
        assert_eq!((small.width(), small.height()), (50, 50));
        let back = small.resize(100, 100).unwrap();
        assert_eq!((back.width(), back.height()), (100, 100));
    }

    #[test]
    fn resize_rejects_zero() {
        let buf = PixelBuffer::new(4, 4, WHITE).unwrap();
        assert!(matches!(
            buf.resize(0, 5),
            Err(EditorError::InvalidDimension { width: 0, height: 5 })
        ));
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        // Marker in the top-right corner of a 4×2 image.
        let mut buf = PixelBuffer::new(4, 2, WHITE).unwrap();
        buf.set_pixel(3, 0, RED);
        let out = buf.rotate(90.0);
        assert_eq!((out.width(), out.height()), (2, 4));
        assert_eq!(out.get_pixel(0, 0), Some(RED));

        let cw = buf.rotate(-90.0);
        assert_eq!(cw.get_pixel(1, 3), Some(RED));
    }

    #[test]
    fn full_turns_are_exact() {
        let mut buf = PixelBuffer::new(5, 3, WHITE).unwrap();
        buf.set_pixel(1, 2, BLACK);
        assert!(buf.rotate(360.0).same_pixels(&buf));
        assert!(buf.rotate(180.0).rotate(180.0).same_pixels(&buf));
        assert!(buf.rotate(90.0).rotate(270.0).same_pixels(&buf));
    }

    #[test]
    fn arbitrary_angle_expands_with_transparent_corners() {
        let buf = PixelBuffer::new(10, 10, RED).unwrap();
        let out = buf.rotate(45.0);
        assert_eq!((out.width(), out.height()), (15, 15));
        assert_eq!(out.get_pixel(0, 0), Some(TRANSPARENT));
        assert_eq!(out.get_pixel(7, 7), Some(RED));
    }
}

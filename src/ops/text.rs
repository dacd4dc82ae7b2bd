use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use noto_sans_mono_bitmap::{FontWeight, RasterHeight, get_raster, get_raster_width};

use crate::canvas::{Color, PixelBuffer};
use crate::error::{EditorError, EditorResult};

/// Pixel height of the built-in raster font.
const BUILTIN_HEIGHT: f32 = 16.0;
/// Extra rows between lines of built-in text, before scaling.
const BUILTIN_LINE_SPACING: i32 = 2;

/// Load a TrueType/OpenType font from disk.
pub fn load_font_file(path: &Path) -> EditorResult<FontArc> {
    let bytes = std::fs::read(path).map_err(|e| EditorError::io(path, e))?;
    FontArc::try_from_vec(bytes).map_err(|e| EditorError::io(path, e))
}

/// Lay out a single line of text starting at x = 0.
/// Returns `(glyphs, total_width)`; each glyph is `(id, x_offset)`.
pub fn layout_line(font: &FontArc, text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
    (glyphs, cursor_x)
}

/// Integer magnification applied to the 16px built-in font for `font_size`.
pub fn builtin_scale(font_size: f32) -> i32 {
    (font_size / BUILTIN_HEIGHT).round().max(1.0) as i32
}

impl PixelBuffer {
    /// Render `text` with its top-left corner at `pos`. `'\n'` starts a new
    /// line. With no font the built-in monospace raster is used instead.
    pub fn draw_text(
        &mut self,
        pos: (i32, i32),
        text: &str,
        color: Color,
        font: Option<&FontArc>,
        font_size: f32,
    ) {
        if text.is_empty() {
            return;
        }
        let font_size = font_size.max(1.0);
        match font {
            Some(f) => self.draw_text_outline(pos, text, color, f, font_size),
            None => self.draw_text_builtin(pos, text, color, builtin_scale(font_size)),
        }
        self.set_modified(true);
    }

    fn draw_text_outline(&mut self, pos: (i32, i32), text: &str, color: Color, font: &FontArc, font_size: f32) {
        let scaled = font.as_scaled(font_size);
        let ascent = scaled.ascent();
        let line_height = scaled.height() + scaled.line_gap();

        for (line_idx, line) in text.split('\n').enumerate() {
            let baseline = pos.1 as f32 + ascent + line_idx as f32 * line_height;
            let (glyphs, _) = layout_line(font, line, font_size);
            for (id, gx) in glyphs {
                let glyph = id.with_scale_and_position(font_size, point(pos.0 as f32 + gx, baseline));
                let Some(outlined) = font.outline_glyph(glyph) else { continue };
                let bounds = outlined.px_bounds();
                let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
                outlined.draw(|x, y, coverage| {
                    self.blend_unflagged(ox + x as i32, oy + y as i32, color, coverage);
                });
            }
        }
    }

    fn draw_text_builtin(&mut self, pos: (i32, i32), text: &str, color: Color, scale: i32) {
        let advance = get_raster_width(FontWeight::Regular, RasterHeight::Size16) as i32 * scale;
        let line_height = (BUILTIN_HEIGHT as i32 + BUILTIN_LINE_SPACING) * scale;

        for (line_idx, line) in text.split('\n').enumerate() {
            let y0 = pos.1 + line_idx as i32 * line_height;
            for (i, ch) in line.chars().enumerate() {
                let x0 = pos.0 + i as i32 * advance;
                let Some(rc) = get_raster(ch, FontWeight::Regular, RasterHeight::Size16)
                    .or_else(|| get_raster('?', FontWeight::Regular, RasterHeight::Size16))
                else {
                    continue;
                };
                let width = rc.width();
                for (ry, row) in rc.raster().iter().enumerate() {
                    for (rx, &intensity) in row.iter().take(width).enumerate() {
                        if intensity == 0 {
                            continue;
                        }
                        let coverage = intensity as f32 / 255.0;
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.blend_unflagged(
                                    x0 + rx as i32 * scale + sx,
                                    y0 + ry as i32 * scale + sy,
                                    color,
                                    coverage,
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

use crate::canvas::{Color, PixelBuffer, Rect};

// ============================================================================
// SDF helpers — return signed distance (negative = inside)
// ============================================================================

/// SDF for an ellipse centred at origin (approximation).
#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    // Normalise point to circle space
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    // Distance from normalised circle surface, scaled back
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// Integer points of the segment `a → b`, endpoints included (Bresenham).
pub fn line_points(a: (i32, i32), b: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x, mut y) = (a.0 as i64, a.1 as i64);
    let (bx, by) = (b.0 as i64, b.1 as i64);
    let dx = (bx - x).abs();
    let dy = -(by - y).abs();
    let sx = if x < bx { 1 } else { -1 };
    let sy = if y < by { 1 } else { -1 };
    let mut err = dx + dy;
    let mut pts = Vec::with_capacity((dx - dy).min(1 << 16) as usize + 1);
    loop {
        pts.push((x as i32, y as i32));
        if x == bx && y == by {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    pts
}

/// Clip the segment `a → b` to `bounds` (Liang–Barsky). Endpoints already
/// inside are returned untouched; `None` if the segment misses `bounds`.
pub fn clip_segment(a: (i32, i32), b: (i32, i32), bounds: Rect) -> Option<((i32, i32), (i32, i32))> {
    if bounds.is_empty() {
        return None;
    }
    let (x0, y0) = (a.0 as f64, a.1 as f64);
    let (dx, dy) = (b.0 as f64 - x0, b.1 as f64 - y0);
    let (xmin, ymin) = (bounds.x1 as f64, bounds.y1 as f64);
    let (xmax, ymax) = (bounds.x2 as f64 - 1.0, bounds.y2 as f64 - 1.0);

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [(-dx, x0 - xmin), (dx, xmax - x0), (-dy, y0 - ymin), (dy, ymax - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let at = |t: f64| ((x0 + dx * t).round() as i32, (y0 + dy * t).round() as i32);
    let start = if t0 > 0.0 { at(t0) } else { a };
    let end = if t1 < 1.0 { at(t1) } else { b };
    Some((start, end))
}

// ============================================================================
// IMMEDIATE-MODE PRIMITIVES
// ============================================================================

impl PixelBuffer {
    /// Stamp a solid disc of `diameter` pixels centred on `(cx, cy)`.
    /// Pixels are replaced, not blended, so a transparent colour erases.
    pub fn stamp_circle(&mut self, cx: i32, cy: i32, diameter: u32, color: Color) {
        if diameter <= 1 {
            self.set_pixel(cx, cy, color);
            return;
        }
        let r = diameter as f32 / 2.0;
        let r2 = r * r;
        let reach = r.ceil() as i32;
        let area = Rect::new(
            cx.saturating_sub(reach),
            cy.saturating_sub(reach),
            cx.saturating_add(reach).saturating_add(1),
            cy.saturating_add(reach).saturating_add(1),
        );
        if let Some(area) = area.clamp_to(self.width(), self.height()) {
            for y in area.y1..area.y2 {
                for x in area.x1..area.x2 {
                    let (dx, dy) = (x as i64 - cx as i64, y as i64 - cy as i64);
                    if ((dx * dx + dy * dy) as f32) < r2 {
                        self.put_unflagged(x, y, color);
                    }
                }
            }
        }
        self.set_modified(true);
    }

    /// Straight line from `p1` to `p2` (direction preserved). Widths below 1
    /// are treated as 1; wider lines stamp a disc at every step.
    pub fn draw_line(&mut self, p1: (i32, i32), p2: (i32, i32), color: Color, width: i32) {
        let width = width.max(1) as u32;
        let reach = (width / 2 + 1).min(1 << 16) as i32;
        let Some((p1, p2)) = clip_segment(p1, p2, self.bounds().inflate(reach)) else { return };
        for (x, y) in line_points(p1, p2) {
            if width == 1 {
                self.put_unflagged(x, y, color);
            } else {
                self.stamp_circle(x, y, width, color);
            }
        }
        self.set_modified(true);
    }

    /// Axis-aligned rectangle covering `bbox`. The outline is `width` pixels
    /// thick, measured inwards; `fill` paints the interior first.
    pub fn draw_rectangle(&mut self, bbox: Rect, color: Color, width: i32, fill: Option<Color>) {
        if bbox.is_empty() {
            return;
        }
        let w = width.max(1);
        if let Some(fc) = fill {
            self.fill_region(bbox, fc);
        }
        // Top, bottom, left, right bands.
        self.fill_region(Rect::new(bbox.x1, bbox.y1, bbox.x2, (bbox.y1 + w).min(bbox.y2)), color);
        self.fill_region(Rect::new(bbox.x1, (bbox.y2 - w).max(bbox.y1), bbox.x2, bbox.y2), color);
        self.fill_region(Rect::new(bbox.x1, bbox.y1, (bbox.x1 + w).min(bbox.x2), bbox.y2), color);
        self.fill_region(Rect::new((bbox.x2 - w).max(bbox.x1), bbox.y1, bbox.x2, bbox.y2), color);
        self.set_modified(true);
    }

    /// Ellipse inscribed in `bbox`. Pixel centres within `width` of the edge
    /// (inside) take `color`; deeper interior pixels take `fill` when given.
    pub fn draw_ellipse(&mut self, bbox: Rect, color: Color, width: i32, fill: Option<Color>) {
        if bbox.is_empty() {
            return;
        }
        let w = width.max(1) as f32;
        let rx = bbox.width() as f32 / 2.0;
        let ry = bbox.height() as f32 / 2.0;
        let cx = bbox.x1 as f32 + rx;
        let cy = bbox.y1 as f32 + ry;

        let Some(visible) = bbox.clamp_to(self.width(), self.height()) else { return };
        for y in visible.y1..visible.y2 {
            for x in visible.x1..visible.x2 {
                let d = sdf_ellipse(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy, rx, ry);
                if d > 0.0 {
                    continue;
                }
                if d > -w {
                    self.put_unflagged(x, y, color);
                } else if let Some(fc) = fill {
                    self.put_unflagged(x, y, fc);
                }
            }
        }
        self.set_modified(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT, WHITE};
    use image::Rgba;

    const RED: Color = Rgba([255, 0, 0, 255]);

    fn count(buf: &PixelBuffer, c: Color) -> usize {
        buf.as_raw().chunks(4).filter(|p| *p == c.0).count()
    }

    #[test]
    fn line_points_include_both_ends() {
        assert_eq!(line_points((0, 0), (3, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(line_points((2, 2), (2, 2)), vec![(2, 2)]);
        let diag = line_points((3, 3), (0, 0));
        assert_eq!(diag.first(), Some(&(3, 3)));
        assert_eq!(diag.last(), Some(&(0, 0)));
        assert_eq!(diag.len(), 4);
    }

    #[test]
    fn one_pixel_stamp_is_a_point() {
        let mut buf = PixelBuffer::new(5, 5, WHITE).unwrap();
        buf.stamp_circle(2, 2, 1, BLACK);
        assert_eq!(count(&buf, BLACK), 1);
        assert_eq!(buf.get_pixel(2, 2), Some(BLACK));
    }

    #[test]
    fn stamp_is_symmetric_and_clipped() {
        let mut buf = PixelBuffer::new(11, 11, WHITE).unwrap();
        buf.stamp_circle(5, 5, 5, RED);
        for (dx, dy) in [(2, 0), (-2, 0), (0, 2), (0, -2), (1, 1), (-1, -1)] {
            assert_eq!(buf.get_pixel(5 + dx, 5 + dy), Some(RED));
        }
        assert_eq!(buf.get_pixel(7, 7), Some(WHITE));

        let mut edge = PixelBuffer::new(4, 4, WHITE).unwrap();
        edge.stamp_circle(0, 0, 5, RED);
        assert_eq!(edge.get_pixel(0, 0), Some(RED));
        assert_eq!(edge.get_pixel(3, 3), Some(WHITE));

        edge.stamp_circle(i32::MAX, i32::MIN, 9, BLACK);
        assert_eq!(count(&edge, BLACK), 0);
    }

    #[test]
    fn transparent_stamp_erases() {
        let mut buf = PixelBuffer::new(5, 5, RED).unwrap();
        buf.stamp_circle(2, 2, 3, TRANSPARENT);
        assert_eq!(buf.get_pixel(2, 2), Some(TRANSPARENT));
    }

    #[test]
    fn zero_width_line_draws_one_pixel_wide() {
        let mut buf = PixelBuffer::new(10, 3, WHITE).unwrap();
        buf.draw_line((1, 1), (8, 1), BLACK, 0);
        assert_eq!(count(&buf, BLACK), 8);
        assert!(buf.is_modified());
    }

    #[test]
    fn line_outside_buffer_is_clipped() {
        let mut buf = PixelBuffer::new(4, 4, WHITE).unwrap();
        buf.draw_line((-10, 1), (20, 1), BLACK, 1);
        assert_eq!(count(&buf, BLACK), 4);
    }

    #[test]
    fn clip_segment_trims_to_bounds() {
        let bounds = Rect::new(0, 0, 10, 10);
        assert_eq!(clip_segment((2, 2), (7, 3), bounds), Some(((2, 2), (7, 3))));
        assert_eq!(clip_segment((-5, 4), (20, 4), bounds), Some(((0, 4), (9, 4))));
        assert_eq!(clip_segment((-5, -5), (-1, 20), bounds), None);
        assert_eq!(clip_segment((i32::MAX, 3), (i32::MIN, 3), bounds), Some(((9, 3), (0, 3))));
    }

    #[test]
    fn extreme_line_endpoints_stay_cheap() {
        let mut buf = PixelBuffer::new(8, 8, WHITE).unwrap();
        buf.draw_line((i32::MAX, 4), (i32::MIN, 4), BLACK, 3);
        assert_eq!(buf.get_pixel(0, 4), Some(BLACK));
        assert_eq!(buf.get_pixel(7, 4), Some(BLACK));
        assert_eq!(line_points((i32::MAX, 0), (i32::MAX - 2, 0)).len(), 3);

        let mut huge = PixelBuffer::new(6, 6, WHITE).unwrap();
        huge.draw_ellipse(Rect::new(-1_000_000, -1_000_000, 1_000_000, 1_000_000), RED, 1, Some(RED));
        assert_eq!(count(&huge, RED), 36);
    }

    #[test]
    fn rectangle_outline_and_fill() {
        let mut buf = PixelBuffer::new(8, 8, WHITE).unwrap();
        buf.draw_rectangle(Rect::new(1, 1, 7, 7), BLACK, 1, None);
        assert_eq!(count(&buf, BLACK), 20);
        assert_eq!(buf.get_pixel(3, 3), Some(WHITE));

        buf.draw_rectangle(Rect::new(1, 1, 7, 7), BLACK, 1, Some(RED));
        assert_eq!(count(&buf, RED), 16);
        assert_eq!(buf.get_pixel(1, 1), Some(BLACK));
    }

    #[test]
    fn thick_rectangle_saturates_to_solid() {
        let mut buf = PixelBuffer::new(6, 6, WHITE).unwrap();
        buf.draw_rectangle(Rect::new(0, 0, 4, 4), BLACK, 10, None);
        assert_eq!(count(&buf, BLACK), 16);
    }

    #[test]
    fn ellipse_stays_inside_bbox() {
        let mut buf = PixelBuffer::new(20, 20, WHITE).unwrap();
        let bbox = Rect::new(2, 4, 18, 14);
        buf.draw_ellipse(bbox, BLACK, 1, Some(RED));
        for y in 0..20 {
            for x in 0..20 {
                if !bbox.contains(x, y) {
                    assert_eq!(buf.get_pixel(x, y), Some(WHITE));
                }
            }
        }
        assert_eq!(buf.get_pixel(10, 9), Some(RED));
        assert_eq!(buf.get_pixel(2, 4), Some(WHITE));
        assert!(count(&buf, BLACK) > 0);
    }

    #[test]
    fn shapes_are_deterministic() {
        let draw = || {
            let mut b = PixelBuffer::new(30, 30, WHITE).unwrap();
            b.draw_ellipse(Rect::new(3, 5, 27, 22), RED, 3, None);
            b.draw_line((0, 29), (29, 0), BLACK, 4);
            b
        };
        assert!(draw().same_pixels(&draw()));
    }
}

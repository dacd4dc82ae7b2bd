// ============================================================================
// FLOOD FILL — 4-connected, exact-colour region growth
// ============================================================================

use crate::canvas::{Color, PixelBuffer};

/// Replace the 4-connected region of pixels equal to the seed pixel's colour
/// with `new_color`. Returns the number of pixels recoloured.
///
/// Colour equality is exact on all four channels. A seed outside the buffer,
/// or a seed already equal to `new_color`, is a no-op. Uses an explicit stack
/// so large uniform regions cannot exhaust the call stack.
pub fn flood_fill(buffer: &mut PixelBuffer, seed_x: i32, seed_y: i32, new_color: Color) -> usize {
    let Some(target) = buffer.get_pixel(seed_x, seed_y) else {
        return 0;
    };
    if target == new_color {
        return 0;
    }

    let w = buffer.width() as usize;
    let h = buffer.height() as usize;
    let tc = target.0;
    let fc = new_color.0;

    // Visited mask, one byte per pixel.
    let mut visited = vec![false; w * h];
    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    stack.push((seed_y as usize * w + seed_x as usize) as u32);

    let mut filled = 0usize;
    let raw: &mut [u8] = buffer.pixels_mut();

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        if visited[idx] {
            continue;
        }
        let o = idx * 4;
        if raw[o..o + 4] != tc {
            continue;
        }
        raw[o..o + 4].copy_from_slice(&fc);
        visited[idx] = true;
        filled += 1;

        let x = idx % w;
        let y = idx / w;
        if x + 1 < w {
            stack.push((idx + 1) as u32);
        }
        if x > 0 {
            stack.push((idx - 1) as u32);
        }
        if y + 1 < h {
            stack.push((idx + w) as u32);
        }
        if y > 0 {
            stack.push((idx - w) as u32);
        }
    }

    if filled > 0 {
        buffer.set_modified(true);
    }
    filled
}

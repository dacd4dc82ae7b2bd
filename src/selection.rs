// ============================================================================
// SELECTION — rectangular region of interest, move preview, clipboard
// ============================================================================

use crate::canvas::{PixelBuffer, Rect, TRANSPARENT};
use crate::error::{EditorError, EditorResult};

/// Lifecycle of the single rectangular selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    None,
    /// Rubber-band in progress from `start` to `current`.
    Dragging { start: (i32, i32), current: (i32, i32) },
    /// Fixed rectangle, no move in progress.
    Defined { rect: Rect },
    /// `rect` is being dragged; `grab` is the press point relative to its
    /// origin and `origin` the tentative (clamped) new top-left corner.
    Moving { rect: Rect, grab: (i32, i32), origin: (i32, i32) },
}

/// A selection narrower or shorter than this is treated as no selection.
const MIN_SELECTION_SIDE: u32 = 2;

#[derive(Clone, Debug, Default)]
pub struct Selection {
    state: SelectionState,
    /// Sub-image under the defined rectangle, carried while moving.
    held: Option<PixelBuffer>,
    clipboard: Option<PixelBuffer>,
    /// Scratch copy shown while moving. Never the authoritative buffer.
    preview: Option<PixelBuffer>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The committed rectangle, if any (the pre-move one while moving).
    pub fn rect(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Defined { rect } | SelectionState::Moving { rect, .. } => Some(rect),
            _ => None,
        }
    }

    /// Normalized rubber-band rectangle while dragging.
    pub fn candidate(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Dragging { start, current } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.rect().is_some()
    }

    pub fn clipboard(&self) -> Option<&PixelBuffer> {
        self.clipboard.as_ref()
    }

    pub fn preview(&self) -> Option<&PixelBuffer> {
        self.preview.as_ref()
    }

    // ------------------------------------------------------------------------
    // Gesture handling
    // ------------------------------------------------------------------------

    /// Start a gesture. Returns `true` when the press grabbed the defined
    /// rectangle, i.e. a move began and the buffer will change at release.
    pub fn press(&mut self, buffer: &PixelBuffer, pos: (i32, i32)) -> bool {
        if let SelectionState::Defined { rect } = self.state {
            if rect.contains(pos.0, pos.1) {
                // Re-extract in case the pixels changed since the selection was made.
                self.held = buffer.copy_region(rect);
                if self.held.is_some() {
                    self.state = SelectionState::Moving {
                        rect,
                        grab: (pos.0 - rect.x1, pos.1 - rect.y1),
                        origin: rect.origin(),
                    };
                    return true;
                }
            }
        }
        self.held = None;
        self.preview = None;
        self.state = SelectionState::Dragging { start: pos, current: pos };
        false
    }

    pub fn drag(&mut self, buffer: &PixelBuffer, pos: (i32, i32)) {
        match self.state {
            SelectionState::Dragging { start, .. } => {
                self.state = SelectionState::Dragging { start, current: pos };
            }
            SelectionState::Moving { rect, grab, .. } => {
                let origin = clamp_origin(rect, (pos.0.saturating_sub(grab.0), pos.1.saturating_sub(grab.1)), buffer);
                self.state = SelectionState::Moving { rect, grab, origin };
                let mut scratch = buffer.clone();
                if let Some(held) = &self.held {
                    apply_move(&mut scratch, rect, held, origin);
                }
                self.preview = Some(scratch);
            }
            _ => {}
        }
    }

    /// Finish the gesture. Returns `true` if `buffer` was modified.
    pub fn release(&mut self, buffer: &mut PixelBuffer, pos: (i32, i32)) -> bool {
        match self.state {
            SelectionState::Dragging { start, .. } => {
                let committed = Rect::from_points(start, pos)
                    .clamp_to(buffer.width(), buffer.height())
                    .filter(|r| r.width() >= MIN_SELECTION_SIDE && r.height() >= MIN_SELECTION_SIDE);
                match committed {
                    Some(rect) => {
                        self.held = buffer.copy_region(rect);
                        self.state = SelectionState::Defined { rect };
                    }
                    None => self.deselect(),
                }
                false
            }
            SelectionState::Moving { rect, grab, .. } => {
                let origin = clamp_origin(rect, (pos.0.saturating_sub(grab.0), pos.1.saturating_sub(grab.1)), buffer);
                self.preview = None;
                let moved = origin != rect.origin();
                if moved {
                    if let Some(held) = &self.held {
                        apply_move(buffer, rect, held, origin);
                    }
                }
                self.state = SelectionState::Defined {
                    rect: Rect::from_origin_size(origin.0, origin.1, rect.width(), rect.height()),
                };
                moved
            }
            // Release without a press.
            _ => false,
        }
    }

    /// Abandon an in-flight gesture without committing anything.
    pub fn cancel(&mut self) {
        self.preview = None;
        match self.state {
            SelectionState::Dragging { .. } => self.deselect(),
            SelectionState::Moving { rect, .. } => self.state = SelectionState::Defined { rect },
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Programmatic selection
    // ------------------------------------------------------------------------

    /// Select `rect` (clipped to the buffer).
    pub fn set_rect(&mut self, buffer: &PixelBuffer, rect: Rect) -> EditorResult<()> {
        let clipped = rect
            .clamp_to(buffer.width(), buffer.height())
            .ok_or(EditorError::InvalidRegion { rect })?;
        self.preview = None;
        self.held = buffer.copy_region(clipped);
        self.state = SelectionState::Defined { rect: clipped };
        Ok(())
    }

    pub fn select_all(&mut self, buffer: &PixelBuffer) {
        self.preview = None;
        self.held = buffer.copy_region(buffer.bounds());
        self.state = SelectionState::Defined { rect: buffer.bounds() };
    }

    /// Drop the selection (the clipboard is kept).
    pub fn deselect(&mut self) {
        self.state = SelectionState::None;
        self.held = None;
        self.preview = None;
    }

    // ------------------------------------------------------------------------
    // Clipboard operations
    // ------------------------------------------------------------------------

    fn defined_rect(&self) -> EditorResult<Rect> {
        match self.state {
            SelectionState::Defined { rect } => Ok(rect),
            _ => Err(EditorError::ToolMisuse("no active selection")),
        }
    }

    /// Copy the selected pixels to the clipboard and clear them to transparent.
    pub fn cut(&mut self, buffer: &mut PixelBuffer) -> EditorResult<()> {
        let rect = self.defined_rect()?;
        self.clipboard = buffer.copy_region(rect);
        buffer.fill_region(rect, TRANSPARENT);
        self.deselect();
        Ok(())
    }

    pub fn copy(&mut self, buffer: &PixelBuffer) -> EditorResult<()> {
        let rect = self.defined_rect()?;
        self.clipboard = buffer.copy_region(rect);
        Ok(())
    }

    /// Alpha-composite the clipboard with its top-left corner at `origin`.
    pub fn paste(&self, buffer: &mut PixelBuffer, origin: (i32, i32)) -> EditorResult<()> {
        let clip = self
            .clipboard
            .as_ref()
            .ok_or(EditorError::ToolMisuse("clipboard is empty"))?;
        buffer.composite_paste(clip, origin.0, origin.1);
        Ok(())
    }

    /// Clear the selected pixels to transparent and drop the selection.
    pub fn delete(&mut self, buffer: &mut PixelBuffer) -> EditorResult<()> {
        let rect = self.defined_rect()?;
        buffer.fill_region(rect, TRANSPARENT);
        self.deselect();
        Ok(())
    }
}

/// Keep a `rect`-sized block at `origin` fully inside the buffer.
fn clamp_origin(rect: Rect, origin: (i32, i32), buffer: &PixelBuffer) -> (i32, i32) {
    let max_x = (buffer.width() as i32 - rect.width() as i32).max(0);
    let max_y = (buffer.height() as i32 - rect.height() as i32).max(0);
    (origin.0.clamp(0, max_x), origin.1.clamp(0, max_y))
}

/// Clear `from` to transparent, then composite `held` at `to`.
fn apply_move(buffer: &mut PixelBuffer, from: Rect, held: &PixelBuffer, to: (i32, i32)) {
    buffer.fill_region(from, TRANSPARENT);
    buffer.composite_paste(held, to.0, to.1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, WHITE};
    use image::Rgba;

    const RED: Color = Rgba([255, 0, 0, 255]);
    const BLUE: Color = Rgba([0, 0, 255, 255]);

    fn select(sel: &mut Selection, buf: &mut PixelBuffer, a: (i32, i32), b: (i32, i32)) {
        sel.press(buf, a);
        sel.drag(buf, b);
        sel.release(buf, b);
    }

    #[test]
    fn drag_defines_normalized_rect() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        let mut sel = Selection::new();
        sel.press(&buf, (6, 7));
        sel.drag(&buf, (2, 3));
        assert_eq!(sel.candidate(), Some(Rect::new(2, 3, 6, 7)));
        assert!(!sel.release(&mut buf, (2, 3)));
        assert_eq!(sel.rect(), Some(Rect::new(2, 3, 6, 7)));
        assert!(!buf.is_modified());
    }

    #[test]
    fn tiny_drag_means_no_selection() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (2, 2), (3, 8));
        assert_eq!(sel.state(), SelectionState::None);
        select(&mut sel, &mut buf, (4, 4), (4, 4));
        assert!(!sel.is_active());
    }

    #[test]
    fn selection_is_clamped_to_buffer() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (-5, 5), (20, 8));
        assert_eq!(sel.rect(), Some(Rect::new(0, 5, 10, 8)));
    }

    #[test]
    fn cut_clears_to_transparent_and_fills_clipboard() {
        let mut buf = PixelBuffer::new(10, 10, RED).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (2, 2), (6, 6));
        sel.cut(&mut buf).unwrap();

        for y in 2..6 {
            for x in 2..6 {
                assert_eq!(buf.get_pixel(x, y), Some(TRANSPARENT));
            }
        }
        assert_eq!(buf.get_pixel(1, 1), Some(RED));
        let clip = sel.clipboard().unwrap();
        assert_eq!((clip.width(), clip.height()), (4, 4));
        assert!(clip.as_raw().chunks(4).all(|p| p == RED.0));
        assert_eq!(sel.state(), SelectionState::None);
    }

    #[test]
    fn copy_leaves_buffer_and_selection() {
        let mut buf = PixelBuffer::new(10, 10, RED).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (0, 0), (3, 3));
        sel.copy(&buf).unwrap();
        assert!(!buf.is_modified());
        assert!(sel.is_active());
        assert_eq!(sel.clipboard().map(|c| c.width()), Some(3));
    }

    #[test]
    fn clipboard_ops_without_selection_are_misuse() {
        let mut buf = PixelBuffer::new(4, 4, WHITE).unwrap();
        let mut sel = Selection::new();
        assert!(matches!(sel.cut(&mut buf), Err(EditorError::ToolMisuse(_))));
        assert!(matches!(sel.copy(&buf), Err(EditorError::ToolMisuse(_))));
        assert!(matches!(sel.delete(&mut buf), Err(EditorError::ToolMisuse(_))));
        assert!(matches!(sel.paste(&mut buf, (0, 0)), Err(EditorError::ToolMisuse(_))));
        assert!(!buf.is_modified());
    }

    #[test]
    fn paste_composites_without_changing_state() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        buf.fill_region(Rect::new(0, 0, 2, 2), BLUE);
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (0, 0), (2, 2));
        sel.copy(&buf).unwrap();
        sel.paste(&mut buf, (7, 7)).unwrap();
        assert_eq!(buf.get_pixel(8, 8), Some(BLUE));
        assert_eq!(sel.rect(), Some(Rect::new(0, 0, 2, 2)));
    }

    #[test]
    fn delete_clears_and_deselects() {
        let mut buf = PixelBuffer::new(6, 6, RED).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (1, 1), (4, 4));
        sel.delete(&mut buf).unwrap();
        assert_eq!(buf.get_pixel(2, 2), Some(TRANSPARENT));
        assert!(!sel.is_active());
    }

    #[test]
    fn move_previews_on_scratch_then_commits() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        buf.fill_region(Rect::new(1, 1, 3, 3), BLUE);
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (1, 1), (3, 3));
        buf.set_modified(false);

        assert!(sel.press(&buf, (2, 2)));
        sel.drag(&buf, (6, 5));
        let preview = sel.preview().unwrap();
        assert_eq!(preview.get_pixel(5, 4), Some(BLUE));
        assert_eq!(preview.get_pixel(1, 1), Some(TRANSPARENT));
        // Authoritative buffer untouched until release.
        assert_eq!(buf.get_pixel(1, 1), Some(BLUE));
        assert!(!buf.is_modified());

        assert!(sel.release(&mut buf, (6, 5)));
        assert!(sel.preview().is_none());
        assert_eq!(sel.rect(), Some(Rect::new(5, 4, 7, 6)));
        assert_eq!(buf.get_pixel(5, 4), Some(BLUE));
        assert_eq!(buf.get_pixel(1, 1), Some(TRANSPARENT));
        assert!(buf.is_modified());
    }

    #[test]
    fn move_is_clamped_inside_buffer() {
        let mut buf = PixelBuffer::new(10, 10, WHITE).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (0, 0), (4, 4));
        sel.press(&buf, (1, 1));
        sel.release(&mut buf, (50, -50));
        assert_eq!(sel.rect(), Some(Rect::new(6, 0, 10, 4)));

        sel.press(&buf, (8, 2));
        sel.drag(&buf, (i32::MIN, i32::MAX));
        sel.release(&mut buf, (i32::MIN, i32::MAX));
        assert_eq!(sel.rect(), Some(Rect::new(0, 6, 4, 10)));
    }

    #[test]
    fn click_inside_without_moving_changes_nothing() {
        let mut buf = PixelBuffer::new(8, 8, Rgba([9, 9, 9, 100])).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (1, 1), (5, 5));
        let before = buf.clone();
        assert!(sel.press(&buf, (2, 2)));
        assert!(!sel.release(&mut buf, (2, 2)));
        assert!(buf.same_pixels(&before));
        assert_eq!(sel.rect(), Some(Rect::new(1, 1, 5, 5)));
    }

    #[test]
    fn cancel_abandons_a_move() {
        let mut buf = PixelBuffer::new(8, 8, WHITE).unwrap();
        let mut sel = Selection::new();
        select(&mut sel, &mut buf, (1, 1), (4, 4));
        sel.press(&buf, (2, 2));
        sel.drag(&buf, (6, 6));
        sel.cancel();
        assert!(sel.preview().is_none());
        assert_eq!(sel.state(), SelectionState::Defined { rect: Rect::new(1, 1, 4, 4) });
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut buf = PixelBuffer::new(4, 4, WHITE).unwrap();
        let mut sel = Selection::new();
        assert!(!sel.release(&mut buf, (1, 1)));
        assert_eq!(sel.state(), SelectionState::None);
    }

    #[test]
    fn set_rect_outside_buffer_is_invalid_region() {
        let buf = PixelBuffer::new(4, 4, WHITE).unwrap();
        let mut sel = Selection::new();
        assert!(matches!(
            sel.set_rect(&buf, Rect::new(10, 10, 20, 20)),
            Err(EditorError::InvalidRegion { .. })
        ));
        sel.select_all(&buf);
        assert_eq!(sel.rect(), Some(Rect::new(0, 0, 4, 4)));
    }
}

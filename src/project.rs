use std::path::Path;

use ab_glyph::FontArc;
use uuid::Uuid;

use crate::canvas::{Color, PixelBuffer, Rect, TRANSPARENT};
use crate::components::dialogs::{HostDialogs, NoDialogs};
use crate::components::history::HistoryManager;
use crate::components::tools::{Tool, ToolConfig, ToolContext, ToolKind};
use crate::error::{EditorError, EditorResult};
use crate::io::FileHandler;
use crate::ops::adjustments::Filter;
use crate::ops::fill::flood_fill;
use crate::ops::text::load_font_file;
use crate::selection::Selection;
use crate::settings::EditorSettings;
use crate::surface::{DisplaySurface, NullSurface};
use crate::{log_info, log_warn};

/// Bookkeeping for the gesture currently in progress.
#[derive(Clone, Copy, Debug)]
struct Gesture {
    /// Whether the press pushed a snapshot that release may need to drop.
    pushed: bool,
    /// Dirty flag before the press, restored if the gesture changes nothing.
    was_modified: bool,
    last: (i32, i32),
}

// ============================================================================
// EDITOR SESSION — the single open document
// ============================================================================

/// Owns the authoritative buffer and everything that acts on it. Tools only
/// ever see a borrow of the buffer for the length of one event.
pub struct EditorSession<S: DisplaySurface = NullSurface> {
    id: Uuid,
    /// Display name (file name or "Untitled")
    name: String,
    buffer: PixelBuffer,
    selection: Selection,
    history: HistoryManager,
    tool: Tool,
    config: ToolConfig,
    background: Color,
    eraser_transparent: bool,
    file_handler: FileHandler,
    dialogs: Box<dyn HostDialogs>,
    surface: S,
    /// Default font for the Text tool when the host resolves none.
    font: Option<FontArc>,
    gesture: Option<Gesture>,
}

impl EditorSession<NullSurface> {
    /// Blank `width`×`height` document with default tool settings.
    pub fn new(width: u32, height: u32, background: Color) -> EditorResult<Self> {
        let buffer = PixelBuffer::new(width, height, background)?;
        let config = ToolConfig { erase_color: background, ..ToolConfig::default() };
        Ok(Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            buffer,
            selection: Selection::new(),
            history: HistoryManager::default(),
            tool: Tool::new(ToolKind::default(), &config),
            config,
            background,
            eraser_transparent: false,
            file_handler: FileHandler::new(),
            dialogs: Box::new(NoDialogs),
            surface: NullSurface,
            font: None,
            gesture: None,
        })
    }

    pub fn with_settings(settings: &EditorSettings) -> EditorResult<Self> {
        let mut session = Self::new(settings.canvas_width, settings.canvas_height, settings.background_color)?;
        session.history = HistoryManager::new(settings.max_undo_steps);
        session.config = settings.tool_config();
        session.eraser_transparent = settings.eraser_transparent;
        session.file_handler = FileHandler::new().with_quality(settings.jpeg_quality);
        session.tool = Tool::new(ToolKind::default(), &session.config);
        if !settings.font_path.is_empty() {
            match load_font_file(Path::new(&settings.font_path)) {
                Ok(font) => session.font = Some(font),
                Err(e) => log_warn!("session: font_path unusable, using built-in font ({})", e),
            }
        }
        Ok(session)
    }
}

impl<S: DisplaySurface> EditorSession<S> {
    /// Re-home the session onto another display surface and show the
    /// current frame on it.
    pub fn with_surface<T: DisplaySurface>(self, surface: T) -> EditorSession<T> {
        let mut session = EditorSession {
            id: self.id,
            name: self.name,
            buffer: self.buffer,
            selection: self.selection,
            history: self.history,
            tool: self.tool,
            config: self.config,
            background: self.background,
            eraser_transparent: self.eraser_transparent,
            file_handler: self.file_handler,
            dialogs: self.dialogs,
            surface,
            font: self.font,
            gesture: self.gesture,
        };
        session.present();
        session
    }

    pub fn set_dialogs(&mut self, dialogs: Box<dyn HostDialogs>) {
        self.dialogs = dialogs;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Stable for the life of the session, including across `with_surface`.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn file_handler(&self) -> &FileHandler {
        &self.file_handler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_modified() {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    /// `(undo entries, redo entries)`
    pub fn history_depth(&self) -> (usize, usize) {
        (self.history.undo_count(), self.history.redo_count())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// What the display should show right now: a moving selection's preview,
    /// else a shape tool's scratch preview, else the buffer itself.
    pub fn display_frame(&self) -> &PixelBuffer {
        frame_of(&self.selection, &self.tool, &self.buffer)
    }

    fn present(&mut self) {
        self.surface.present(frame_of(&self.selection, &self.tool, &self.buffer));
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// Replace the document with a blank one in the background colour.
    pub fn new_image(&mut self, width: u32, height: u32) -> EditorResult<()> {
        let buffer = PixelBuffer::new(width, height, self.background)?;
        self.reset_document(buffer, "Untitled".to_string());
        self.file_handler.current_path = None;
        Ok(())
    }

    pub fn open(&mut self, path: &Path) -> EditorResult<()> {
        let buffer = self.file_handler.open(path)?;
        log_info!("session {}: opened {} ({}x{})", self.id, path.display(), buffer.width(), buffer.height());
        self.reset_document(buffer, file_name(path));
        Ok(())
    }

    /// Ask the host for a path and open it. `Ok(false)` if cancelled.
    pub fn open_from_dialog(&mut self) -> EditorResult<bool> {
        match self.dialogs.pick_open_path() {
            Some(path) => self.open(&path).map(|_| true),
            None => Ok(false),
        }
    }

    fn reset_document(&mut self, buffer: PixelBuffer, name: String) {
        self.end_gesture();
        self.buffer = buffer;
        self.buffer.set_modified(false);
        self.history.clear();
        self.selection.deselect();
        self.name = name;
        self.present();
    }

    /// Save to the current path, or ask the host for one if the document
    /// was never saved. `Ok(false)` if the host cancelled.
    pub fn save(&mut self) -> EditorResult<bool> {
        self.end_gesture();
        if self.file_handler.has_current_path() {
            self.file_handler.quick_save(&self.buffer)?;
            self.buffer.set_modified(false);
            return Ok(true);
        }
        match self.dialogs.pick_save_path(self.file_handler.last_format) {
            Some(path) => self.save_as(&path).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn save_as(&mut self, path: &Path) -> EditorResult<()> {
        self.end_gesture();
        self.file_handler.save_as(&self.buffer, path)?;
        self.buffer.set_modified(false);
        self.name = file_name(path);
        log_info!("session {}: saved {}", self.id, path.display());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tools and drawing parameters
    // ------------------------------------------------------------------------

    /// Deactivate the current tool, then activate a fresh `kind`.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.end_gesture();
        self.tool.deactivate(&mut self.selection);
        self.tool = Tool::new(kind, &self.config);
        self.tool.activate();
        self.present();
    }

    fn reconfigure(&mut self) {
        self.tool.configure(&self.config);
    }

    pub fn current_color(&self) -> Color {
        self.config.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.config.color = color;
        self.reconfigure();
    }

    /// Ask the host colour picker for a new current colour.
    pub fn pick_color(&mut self) -> bool {
        match self.dialogs.pick_color(self.config.color) {
            Some(color) => {
                self.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.config.brush_size = size.max(1);
        self.reconfigure();
    }

    pub fn set_eraser_size(&mut self, size: u32) {
        self.config.eraser_size = size.max(1);
        self.reconfigure();
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.config.line_width = width.max(1);
        self.reconfigure();
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.config.fill = fill;
        self.reconfigure();
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.config.fill_color = color;
        self.reconfigure();
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.config.font_size = size.max(1);
        self.reconfigure();
    }

    pub fn background_color(&self) -> Color {
        self.background
    }

    /// Used by `new_image` and, unless the eraser erases to transparency,
    /// by the eraser.
    pub fn set_background_color(&mut self, color: Color) {
        self.background = color;
        if !self.eraser_transparent {
            self.config.erase_color = color;
        }
        self.reconfigure();
    }

    pub fn set_eraser_transparent(&mut self, transparent: bool) {
        self.eraser_transparent = transparent;
        self.config.erase_color = if transparent { TRANSPARENT } else { self.background };
        self.reconfigure();
    }

    pub fn set_font(&mut self, font: Option<FontArc>) {
        self.font = font;
    }

    // ------------------------------------------------------------------------
    // Gesture dispatch
    // ------------------------------------------------------------------------

    pub fn press(&mut self, pos: (i32, i32)) {
        if let Some(g) = self.gesture {
            self.release(g.last);
        }
        let was_modified = self.buffer.is_modified();
        let pushed = self.tool.kind().snapshots_on_press() && self.history.push_state(&self.buffer);

        let mut ctx = ToolContext {
            buffer: &mut self.buffer,
            selection: &mut self.selection,
            dialogs: self.dialogs.as_mut(),
            font: self.font.as_ref(),
        };
        let response = self.tool.press(&mut ctx, pos);
        // Tools that defer their change to release leave the buffer as it was
        // before the press, so the snapshot can still be taken here.
        let pushed = pushed || (response.needs_snapshot && self.history.push_state(&self.buffer));
        self.gesture = Some(Gesture { pushed, was_modified, last: pos });

        if let Some(color) = response.picked_color {
            self.set_color(color);
        }
        self.present();
    }

    /// Ignored unless a press started a gesture.
    pub fn drag(&mut self, pos: (i32, i32)) {
        let Some(g) = self.gesture.as_mut() else { return };
        g.last = pos;
        let mut ctx = ToolContext {
            buffer: &mut self.buffer,
            selection: &mut self.selection,
            dialogs: self.dialogs.as_mut(),
            font: self.font.as_ref(),
        };
        self.tool.drag(&mut ctx, pos);
        self.present();
    }

    /// Ignored unless a press started a gesture.
    pub fn release(&mut self, pos: (i32, i32)) {
        let Some(g) = self.gesture.take() else { return };
        let mut ctx = ToolContext {
            buffer: &mut self.buffer,
            selection: &mut self.selection,
            dialogs: self.dialogs.as_mut(),
            font: self.font.as_ref(),
        };
        self.tool.release(&mut ctx, pos);
        if g.pushed && self.history.discard_if_unchanged(&self.buffer) {
            self.buffer.set_modified(g.was_modified);
        }
        self.present();
    }

    /// Commit an unfinished gesture at its last position.
    fn end_gesture(&mut self) {
        if let Some(g) = self.gesture {
            self.release(g.last);
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.end_gesture();
        if !self.history.can_undo() {
            return false;
        }
        let current = std::mem::take(&mut self.buffer);
        self.swap_in_history_state(current, true);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.end_gesture();
        if !self.history.can_redo() {
            return false;
        }
        let current = std::mem::take(&mut self.buffer);
        self.swap_in_history_state(current, false);
        true
    }

    /// Drops any selection: its rectangle may not match the restored pixels.
    fn swap_in_history_state(&mut self, current: PixelBuffer, undo: bool) {
        let mut restored = if undo { self.history.undo(current) } else { self.history.redo(current) };
        restored.set_modified(true);
        self.buffer = restored;
        self.selection.deselect();
        self.present();
    }

    // ------------------------------------------------------------------------
    // Whole-buffer operations
    // ------------------------------------------------------------------------

    /// Snapshot, then swap in `next`. Identical results leave no history.
    fn replace_buffer(&mut self, mut next: PixelBuffer) -> bool {
        if next.same_pixels(&self.buffer) {
            return false;
        }
        self.history.push_state(&self.buffer);
        let resized = (next.width(), next.height()) != (self.buffer.width(), self.buffer.height());
        next.set_modified(true);
        self.buffer = next;
        if resized {
            self.selection.deselect();
        }
        self.present();
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) -> EditorResult<()> {
        self.end_gesture();
        let next = self.buffer.resize(width, height)?;
        self.replace_buffer(next);
        Ok(())
    }

    /// Counter-clockwise for positive angles.
    pub fn rotate(&mut self, angle_degrees: f64) {
        self.end_gesture();
        let next = self.buffer.rotate(angle_degrees);
        self.replace_buffer(next);
    }

    pub fn crop(&mut self, rect: Rect) -> EditorResult<()> {
        self.end_gesture();
        let next = self.buffer.crop(rect)?;
        self.replace_buffer(next);
        Ok(())
    }

    pub fn crop_to_selection(&mut self) -> EditorResult<()> {
        let rect = self
            .selection
            .rect()
            .ok_or(EditorError::ToolMisuse("no active selection"))?;
        self.crop(rect)
    }

    pub fn apply_filter(&mut self, filter: Filter) {
        self.end_gesture();
        let mut next = self.buffer.clone();
        next.apply_filter(filter);
        if self.replace_buffer(next) {
            log_info!("session: applied {}", filter.label());
        }
    }

    /// Flood fill outside of the Fill tool. Returns the number of pixels changed.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Color) -> usize {
        self.end_gesture();
        let was_modified = self.buffer.is_modified();
        let pushed = self.history.push_state(&self.buffer);
        let filled = flood_fill(&mut self.buffer, x, y, color);
        if filled == 0 && pushed && self.history.discard_if_unchanged(&self.buffer) {
            self.buffer.set_modified(was_modified);
        }
        self.present();
        filled
    }

    // ------------------------------------------------------------------------
    // Selection and clipboard
    // ------------------------------------------------------------------------

    pub fn select_all(&mut self) {
        self.end_gesture();
        self.selection.select_all(&self.buffer);
        self.present();
    }

    pub fn select(&mut self, rect: Rect) -> EditorResult<()> {
        self.end_gesture();
        self.selection.set_rect(&self.buffer, rect)?;
        self.present();
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.end_gesture();
        self.selection.deselect();
        self.present();
    }

    pub fn copy(&mut self) -> bool {
        self.end_gesture();
        match self.selection.copy(&self.buffer) {
            Ok(()) => true,
            Err(e) => {
                log_warn!("copy: {}", e);
                false
            }
        }
    }

    pub fn cut(&mut self) -> bool {
        self.edit_with_selection("cut", |selection, buffer| selection.cut(buffer))
    }

    pub fn delete_selection(&mut self) -> bool {
        self.edit_with_selection("delete", |selection, buffer| selection.delete(buffer))
    }

    /// Composite the clipboard with its top-left corner at `origin`.
    pub fn paste(&mut self, origin: (i32, i32)) -> bool {
        self.edit_with_selection("paste", |selection, buffer| selection.paste(buffer, origin))
    }

    /// Snapshot, run a buffer-mutating selection op, and drop the snapshot
    /// again if it failed or changed nothing. Misuse is logged, not raised.
    fn edit_with_selection(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Selection, &mut PixelBuffer) -> EditorResult<()>,
    ) -> bool {
        self.end_gesture();
        let was_modified = self.buffer.is_modified();
        let pushed = self.history.push_state(&self.buffer);
        let result = op(&mut self.selection, &mut self.buffer);
        if pushed && self.history.discard_if_unchanged(&self.buffer) {
            self.buffer.set_modified(was_modified);
        }
        self.present();
        match result {
            Ok(()) => true,
            Err(e) => {
                log_warn!("{}: {}", label, e);
                false
            }
        }
    }
}

fn frame_of<'a>(selection: &'a Selection, tool: &'a Tool, buffer: &'a PixelBuffer) -> &'a PixelBuffer {
    selection.preview().or_else(|| tool.preview()).unwrap_or(buffer)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

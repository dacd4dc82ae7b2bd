use ab_glyph::FontArc;

use crate::canvas::{BLACK, Color, PixelBuffer, Rect, WHITE};
use crate::components::dialogs::HostDialogs;
use crate::ops::fill::flood_fill;
use crate::ops::shapes::clip_segment;
use crate::selection::Selection;
use crate::{log_info, log_warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
    Fill,
    Pipette,
    Selection,
    Line,
    Rectangle,
    Ellipse,
    Text,
}

/// Which parts of [`ToolConfig`] a tool listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub accepts_color: bool,
    pub accepts_size: bool,
    pub accepts_fill: bool,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Brush => "Brush",
            ToolKind::Eraser => "Eraser",
            ToolKind::Fill => "Fill",
            ToolKind::Pipette => "Pipette",
            ToolKind::Selection => "Selection",
            ToolKind::Line => "Line",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Text => "Text",
        }
    }

    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Brush,
            ToolKind::Eraser,
            ToolKind::Fill,
            ToolKind::Pipette,
            ToolKind::Selection,
            ToolKind::Line,
            ToolKind::Rectangle,
            ToolKind::Ellipse,
            ToolKind::Text,
        ]
    }

    pub fn capabilities(&self) -> Capabilities {
        let (accepts_color, accepts_size, accepts_fill) = match self {
            ToolKind::Brush => (true, true, false),
            ToolKind::Eraser => (false, true, false),
            ToolKind::Fill => (true, false, false),
            ToolKind::Pipette | ToolKind::Selection => (false, false, false),
            ToolKind::Line => (true, true, false),
            ToolKind::Rectangle | ToolKind::Ellipse => (true, true, true),
            ToolKind::Text => (true, true, false),
        };
        Capabilities { accepts_color, accepts_size, accepts_fill }
    }

    /// Whether every press needs a history snapshot before the tool runs.
    /// The selection tool asks for one only when a press starts a move
    /// (see [`ToolResponse::needs_snapshot`]); the pipette never does.
    pub fn snapshots_on_press(&self) -> bool {
        !matches!(self, ToolKind::Pipette | ToolKind::Selection)
    }
}

// ============================================================================
// SHARED CONFIGURATION
// ============================================================================

/// Drawing parameters owned by the session and pushed into tools whenever
/// they change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolConfig {
    pub color: Color,
    /// Colour the eraser paints with: background or fully transparent.
    pub erase_color: Color,
    pub brush_size: u32,
    pub eraser_size: u32,
    pub line_width: u32,
    pub fill: bool,
    pub fill_color: Color,
    pub font_size: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            color: BLACK,
            erase_color: WHITE,
            brush_size: 5,
            eraser_size: 10,
            line_width: 2,
            fill: false,
            fill_color: BLACK,
            font_size: 12,
        }
    }
}

/// Borrowed for the duration of one event call only.
pub struct ToolContext<'a> {
    pub buffer: &'a mut PixelBuffer,
    pub selection: &'a mut Selection,
    pub dialogs: &'a mut dyn HostDialogs,
    /// Session default font (from settings), used when the host has none.
    pub font: Option<&'a FontArc>,
}

/// Side effects of an event beyond the buffer itself.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ToolResponse {
    /// Set by the pipette: the colour every colour-aware tool should use next.
    pub picked_color: Option<Color>,
    /// The press left the buffer untouched but the gesture will change it
    /// at release, so the session should snapshot now.
    pub needs_snapshot: bool,
}

// ============================================================================
// PER-TOOL STATE
// ============================================================================

/// Brush and eraser: a disc stamped at every interpolated point of the drag.
#[derive(Clone, Debug)]
pub struct StrokeTool {
    pub color: Color,
    pub size: u32,
    /// Stamp spacing is `max(1, size / spacing_divisor)`.
    spacing_divisor: u32,
    last: Option<(i32, i32)>,
}

impl StrokeTool {
    fn new(color: Color, size: u32, spacing_divisor: u32) -> Self {
        Self { color, size: size.max(1), spacing_divisor, last: None }
    }

    pub fn spacing(&self) -> u32 {
        (self.size / self.spacing_divisor).max(1)
    }

    fn press(&mut self, buffer: &mut PixelBuffer, pos: (i32, i32)) {
        buffer.stamp_circle(pos.0, pos.1, self.size, self.color);
        self.last = Some(pos);
    }

    fn drag(&mut self, buffer: &mut PixelBuffer, pos: (i32, i32)) {
        let Some(last) = self.last else { return };
        self.last = Some(pos);
        // Only the part of the segment a stamp could reach matters.
        let reach = (self.size / 2 + 1).min(1 << 16) as i32;
        let Some((from, to)) = clip_segment(last, pos, buffer.bounds().inflate(reach)) else { return };
        let (dx, dy) = ((to.0 - from.0) as f32, (to.1 - from.1) as f32);
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > 0.0 {
            let steps = ((distance / self.spacing() as f32).ceil() as i32).max(1);
            for i in 1..=steps {
                let t = i as f32 / steps as f32;
                let x = from.0 + (dx * t).round() as i32;
                let y = from.1 + (dy * t).round() as i32;
                buffer.stamp_circle(x, y, self.size, self.color);
            }
        }
    }

    fn release(&mut self) {
        self.last = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Ellipse,
}

/// Line / rectangle / ellipse: anchor on press, scratch preview while
/// dragging, commit on release.
#[derive(Clone, Debug)]
pub struct ShapeTool {
    pub kind: ShapeKind,
    pub color: Color,
    pub width: u32,
    pub fill: bool,
    pub fill_color: Color,
    anchor: Option<(i32, i32)>,
    scratch: Option<PixelBuffer>,
}

impl ShapeTool {
    fn new(kind: ShapeKind, cfg: &ToolConfig) -> Self {
        Self {
            kind,
            color: cfg.color,
            width: cfg.line_width.max(1),
            fill: cfg.fill,
            fill_color: cfg.fill_color,
            anchor: None,
            scratch: None,
        }
    }

    pub fn anchor(&self) -> Option<(i32, i32)> {
        self.anchor
    }

    /// Bounding box for rectangle/ellipse: both drag points inclusive.
    pub fn bbox(a: (i32, i32), b: (i32, i32)) -> Rect {
        Rect::new(
            a.0.min(b.0),
            a.1.min(b.1),
            a.0.max(b.0).saturating_add(1),
            a.1.max(b.1).saturating_add(1),
        )
    }

    /// Same geometry for preview and commit.
    fn render(&self, target: &mut PixelBuffer, a: (i32, i32), b: (i32, i32)) {
        let width = self.width as i32;
        let fill = self.fill.then_some(self.fill_color);
        match self.kind {
            ShapeKind::Line => target.draw_line(a, b, self.color, width),
            ShapeKind::Rectangle => target.draw_rectangle(Self::bbox(a, b), self.color, width, fill),
            ShapeKind::Ellipse => target.draw_ellipse(Self::bbox(a, b), self.color, width, fill),
        }
    }

    fn press(&mut self, pos: (i32, i32)) {
        self.anchor = Some(pos);
        self.scratch = None;
    }

    fn drag(&mut self, buffer: &PixelBuffer, pos: (i32, i32)) {
        let Some(anchor) = self.anchor else { return };
        let mut scratch = buffer.clone();
        self.render(&mut scratch, anchor, pos);
        self.scratch = Some(scratch);
    }

    fn release(&mut self, buffer: &mut PixelBuffer, pos: (i32, i32)) {
        self.scratch = None;
        if let Some(anchor) = self.anchor.take() {
            self.render(buffer, anchor, pos);
        }
    }

    fn cancel(&mut self) {
        self.anchor = None;
        self.scratch = None;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TextTool {
    pub color: Color,
    pub font_size: u32,
}

impl TextTool {
    fn press(&self, ctx: &mut ToolContext<'_>, pos: (i32, i32)) {
        let Some(request) = ctx.dialogs.request_text(self.font_size) else { return };
        let text = request.text.trim();
        if text.is_empty() {
            return;
        }
        let host_font = ctx.dialogs.resolve_font();
        let font = host_font.as_ref().or(ctx.font);
        if font.is_none() {
            log_info!("text: no font resolved, using built-in font");
        }
        let size = if request.font_size > 0 { request.font_size } else { self.font_size };
        ctx.buffer.draw_text(pos, text, self.color, font, size as f32);
    }
}

// ============================================================================
// TOOL — tagged union over every tool
// ============================================================================

#[derive(Clone, Debug)]
pub enum Tool {
    Brush(StrokeTool),
    Eraser(StrokeTool),
    Fill { color: Color },
    Pipette,
    Selection,
    Line(ShapeTool),
    Rectangle(ShapeTool),
    Ellipse(ShapeTool),
    Text(TextTool),
}

impl Tool {
    pub fn new(kind: ToolKind, cfg: &ToolConfig) -> Self {
        match kind {
            ToolKind::Brush => Tool::Brush(StrokeTool::new(cfg.color, cfg.brush_size, 3)),
            ToolKind::Eraser => Tool::Eraser(StrokeTool::new(cfg.erase_color, cfg.eraser_size, 2)),
            ToolKind::Fill => Tool::Fill { color: cfg.color },
            ToolKind::Pipette => Tool::Pipette,
            ToolKind::Selection => Tool::Selection,
            ToolKind::Line => Tool::Line(ShapeTool::new(ShapeKind::Line, cfg)),
            ToolKind::Rectangle => Tool::Rectangle(ShapeTool::new(ShapeKind::Rectangle, cfg)),
            ToolKind::Ellipse => Tool::Ellipse(ShapeTool::new(ShapeKind::Ellipse, cfg)),
            ToolKind::Text => Tool::Text(TextTool { color: cfg.color, font_size: cfg.font_size.max(1) }),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::Brush(_) => ToolKind::Brush,
            Tool::Eraser(_) => ToolKind::Eraser,
            Tool::Fill { .. } => ToolKind::Fill,
            Tool::Pipette => ToolKind::Pipette,
            Tool::Selection => ToolKind::Selection,
            Tool::Line(_) => ToolKind::Line,
            Tool::Rectangle(_) => ToolKind::Rectangle,
            Tool::Ellipse(_) => ToolKind::Ellipse,
            Tool::Text(_) => ToolKind::Text,
        }
    }

    /// Apply the parts of `cfg` this tool accepts.
    pub fn configure(&mut self, cfg: &ToolConfig) {
        match self {
            Tool::Brush(s) => {
                s.color = cfg.color;
                s.size = cfg.brush_size.max(1);
            }
            Tool::Eraser(s) => {
                s.color = cfg.erase_color;
                s.size = cfg.eraser_size.max(1);
            }
            Tool::Fill { color } => *color = cfg.color,
            Tool::Pipette | Tool::Selection => {}
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => {
                s.color = cfg.color;
                s.width = cfg.line_width.max(1);
                s.fill = cfg.fill;
                s.fill_color = cfg.fill_color;
            }
            Tool::Text(t) => {
                t.color = cfg.color;
                t.font_size = cfg.font_size.max(1);
            }
        }
    }

    /// Reset any per-gesture state on becoming the active tool.
    pub fn activate(&mut self) {
        self.reset();
        log_info!("tool: {} active", self.kind().label());
    }

    /// Leave the buffer and selection in a consistent, non-preview state.
    pub fn deactivate(&mut self, selection: &mut Selection) {
        if matches!(self, Tool::Selection) {
            selection.cancel();
        }
        self.reset();
    }

    fn reset(&mut self) {
        match self {
            Tool::Brush(s) | Tool::Eraser(s) => s.release(),
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => s.cancel(),
            _ => {}
        }
    }

    /// Scratch preview owned by the tool, if a shape drag is in progress.
    pub fn preview(&self) -> Option<&PixelBuffer> {
        match self {
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => s.scratch.as_ref(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Gesture events
    // ------------------------------------------------------------------------

    pub fn press(&mut self, ctx: &mut ToolContext<'_>, pos: (i32, i32)) -> ToolResponse {
        let mut response = ToolResponse::default();
        match self {
            Tool::Brush(s) | Tool::Eraser(s) => s.press(ctx.buffer, pos),
            Tool::Fill { color } => {
                let filled = flood_fill(ctx.buffer, pos.0, pos.1, *color);
                log_info!("fill: {} pixel(s) at ({}, {})", filled, pos.0, pos.1);
            }
            Tool::Pipette => match ctx.buffer.get_pixel(pos.0, pos.1) {
                Some(c) => response.picked_color = Some(image::Rgba([c[0], c[1], c[2], 255])),
                None => log_warn!("pipette: ({}, {}) is outside the image", pos.0, pos.1),
            },
            Tool::Selection => response.needs_snapshot = ctx.selection.press(ctx.buffer, pos),
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => s.press(pos),
            Tool::Text(t) => t.press(ctx, pos),
        }
        response
    }

    pub fn drag(&mut self, ctx: &mut ToolContext<'_>, pos: (i32, i32)) {
        match self {
            Tool::Brush(s) | Tool::Eraser(s) => s.drag(ctx.buffer, pos),
            Tool::Selection => ctx.selection.drag(ctx.buffer, pos),
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => s.drag(ctx.buffer, pos),
            Tool::Fill { .. } | Tool::Pipette | Tool::Text(_) => {}
        }
    }

    pub fn release(&mut self, ctx: &mut ToolContext<'_>, pos: (i32, i32)) {
        match self {
            Tool::Brush(s) | Tool::Eraser(s) => s.release(),
            Tool::Selection => {
                ctx.selection.release(ctx.buffer, pos);
            }
            Tool::Line(s) | Tool::Rectangle(s) | Tool::Ellipse(s) => s.release(ctx.buffer, pos),
            Tool::Fill { .. } | Tool::Pipette | Tool::Text(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;
    use crate::components::dialogs::{NoDialogs, ScriptedDialogs};
    use image::Rgba;

    const RED: Color = Rgba([255, 0, 0, 255]);

    struct Rig {
        buffer: PixelBuffer,
        selection: Selection,
        dialogs: ScriptedDialogs,
    }

    impl Rig {
        fn new(w: u32, h: u32) -> Self {
            Self {
                buffer: PixelBuffer::new(w, h, WHITE).unwrap(),
                selection: Selection::new(),
                dialogs: ScriptedDialogs::new(),
            }
        }

        fn ctx(&mut self) -> ToolContext<'_> {
            ToolContext {
                buffer: &mut self.buffer,
                selection: &mut self.selection,
                dialogs: &mut self.dialogs,
                font: None,
            }
        }

        fn gesture(&mut self, tool: &mut Tool, points: &[(i32, i32)]) -> ToolResponse {
            let (first, rest) = points.split_first().unwrap();
            let r = tool.press(&mut self.ctx(), *first);
            for p in rest {
                tool.drag(&mut self.ctx(), *p);
            }
            tool.release(&mut self.ctx(), *points.last().unwrap());
            r
        }

        fn count(&self, c: Color) -> usize {
            self.buffer.as_raw().chunks(4).filter(|p| *p == c.0).count()
        }
    }

    fn cfg() -> ToolConfig {
        ToolConfig { color: RED, ..ToolConfig::default() }
    }

    #[test]
    fn capabilities_follow_the_variant() {
        assert!(ToolKind::Rectangle.capabilities().accepts_fill);
        assert!(!ToolKind::Line.capabilities().accepts_fill);
        assert!(!ToolKind::Eraser.capabilities().accepts_color);
        assert!(!ToolKind::Pipette.snapshots_on_press());
        assert!(!ToolKind::Selection.snapshots_on_press());
        assert!(ToolKind::Text.snapshots_on_press());
        for kind in ToolKind::all() {
            assert_eq!(Tool::new(*kind, &cfg()).kind(), *kind);
        }
    }

    #[test]
    fn brush_drag_leaves_no_gaps() {
        let mut rig = Rig::new(40, 5);
        let mut tool = Tool::new(ToolKind::Brush, &ToolConfig { brush_size: 1, ..cfg() });
        rig.gesture(&mut tool, &[(0, 2), (39, 2)]);
        for x in 0..40 {
            assert_eq!(rig.buffer.get_pixel(x, 2), Some(RED), "gap at x={x}");
        }
    }

    #[test]
    fn brush_drag_across_extreme_coordinates() {
        let mut rig = Rig::new(12, 6);
        let mut tool = Tool::new(ToolKind::Brush, &ToolConfig { brush_size: 1, ..cfg() });
        rig.gesture(&mut tool, &[(i32::MAX, 3), (i32::MIN, 3)]);
        for x in 0..12 {
            assert_eq!(rig.buffer.get_pixel(x, 3), Some(RED), "gap at x={x}");
        }
        assert_eq!(rig.count(RED), 12);

        let mut off = Rig::new(12, 6);
        off.gesture(&mut tool, &[(-50, -50), (-40, i32::MAX)]);
        assert_eq!(off.count(RED), 0);
    }

    #[test]
    fn selection_press_asks_for_snapshot_only_when_moving() {
        let mut rig = Rig::new(10, 10);
        let mut tool = Tool::new(ToolKind::Selection, &cfg());
        let r = rig.gesture(&mut tool, &[(1, 1), (6, 6)]);
        assert!(!r.needs_snapshot);
        assert_eq!(rig.selection.rect(), Some(Rect::new(1, 1, 6, 6)));

        let r = tool.press(&mut rig.ctx(), (8, 8));
        assert!(!r.needs_snapshot);
        tool.release(&mut rig.ctx(), (9, 9));
        assert!(!rig.selection.is_active());

        rig.gesture(&mut tool, &[(1, 1), (6, 6)]);
        let r = tool.press(&mut rig.ctx(), (3, 3));
        assert!(r.needs_snapshot);
        assert!(!rig.buffer.is_modified());
    }

    #[test]
    fn stroke_spacing_depends_on_tool() {
        let brush = StrokeTool::new(RED, 9, 3);
        let eraser = StrokeTool::new(WHITE, 9, 2);
        assert_eq!(brush.spacing(), 3);
        assert_eq!(eraser.spacing(), 4);
        assert_eq!(StrokeTool::new(RED, 1, 3).spacing(), 1);
    }

    #[test]
    fn eraser_paints_erase_color() {
        let mut rig = Rig::new(10, 10);
        rig.buffer.fill_region(rig.buffer.bounds(), RED);
        let mut tool = Tool::new(ToolKind::Eraser, &ToolConfig { erase_color: TRANSPARENT, eraser_size: 3, ..cfg() });
        rig.gesture(&mut tool, &[(5, 5)]);
        assert_eq!(rig.buffer.get_pixel(5, 5), Some(TRANSPARENT));
        assert_eq!(rig.buffer.get_pixel(0, 0), Some(RED));
    }

    #[test]
    fn drag_without_press_is_ignored() {
        let mut rig = Rig::new(10, 10);
        let mut tool = Tool::new(ToolKind::Brush, &cfg());
        tool.drag(&mut rig.ctx(), (3, 3));
        tool.release(&mut rig.ctx(), (3, 3));
        let mut line = Tool::new(ToolKind::Line, &cfg());
        line.release(&mut rig.ctx(), (9, 9));
        assert!(!rig.buffer.is_modified());
    }

    #[test]
    fn fill_recolors_region() {
        let mut rig = Rig::new(10, 10);
        let mut tool = Tool::new(ToolKind::Fill, &cfg());
        rig.gesture(&mut tool, &[(5, 5)]);
        assert_eq!(rig.count(RED), 100);
    }

    #[test]
    fn pipette_reads_opaque_color_without_mutating() {
        let mut rig = Rig::new(4, 4);
        rig.buffer.set_pixel(1, 1, Rgba([10, 20, 30, 40]));
        rig.buffer.set_modified(false);
        let mut tool = Tool::new(ToolKind::Pipette, &cfg());
        let r = rig.gesture(&mut tool, &[(1, 1)]);
        assert_eq!(r.picked_color, Some(Rgba([10, 20, 30, 255])));
        assert!(!rig.buffer.is_modified());

        let r = rig.gesture(&mut tool, &[(9, 9)]);
        assert_eq!(r.picked_color, None);
    }

    #[test]
    fn shape_preview_stays_off_the_buffer() {
        let mut rig = Rig::new(20, 20);
        let mut tool = Tool::new(ToolKind::Rectangle, &cfg());
        tool.press(&mut rig.ctx(), (2, 2));
        tool.drag(&mut rig.ctx(), (10, 10));
        assert!(tool.preview().is_some_and(|p| p.get_pixel(2, 2) == Some(RED)));
        assert_eq!(rig.count(RED), 0);

        tool.drag(&mut rig.ctx(), (6, 6));
        let preview = tool.preview().unwrap().clone();
        assert_eq!(preview.get_pixel(10, 10), Some(WHITE));

        tool.release(&mut rig.ctx(), (6, 6));
        assert!(tool.preview().is_none());
        assert!(rig.buffer.same_pixels(&preview));
    }

    #[test]
    fn rectangle_bbox_is_normalized_and_inclusive() {
        assert_eq!(ShapeTool::bbox((6, 7), (2, 3)), Rect::new(2, 3, 7, 8));
        let mut rig = Rig::new(10, 10);
        let mut tool = Tool::new(ToolKind::Rectangle, &ToolConfig { line_width: 1, fill: true, fill_color: BLACK, ..cfg() });
        rig.gesture(&mut tool, &[(6, 6), (2, 2)]);
        assert_eq!(rig.buffer.get_pixel(2, 2), Some(RED));
        assert_eq!(rig.buffer.get_pixel(6, 6), Some(RED));
        assert_eq!(rig.buffer.get_pixel(4, 4), Some(BLACK));
        assert_eq!(rig.buffer.get_pixel(7, 7), Some(WHITE));
    }

    #[test]
    fn line_keeps_direction() {
        let mut rig = Rig::new(10, 10);
        let mut tool = Tool::new(ToolKind::Line, &ToolConfig { line_width: 1, ..cfg() });
        rig.gesture(&mut tool, &[(9, 0), (0, 9)]);
        assert_eq!(rig.buffer.get_pixel(9, 0), Some(RED));
        assert_eq!(rig.buffer.get_pixel(0, 9), Some(RED));
        assert_eq!(rig.count(RED), 10);
    }

    #[test]
    fn text_uses_host_answer_and_falls_back_to_builtin_font() {
        let mut rig = Rig::new(60, 30);
        rig.dialogs = ScriptedDialogs::new().with_text("  Hi  ", 16).with_cancelled_text();
        let mut tool = Tool::new(ToolKind::Text, &cfg());
        rig.gesture(&mut tool, &[(2, 2)]);
        assert!(rig.count(WHITE) < 60 * 30);
        assert!(rig.buffer.is_modified());

        let before = rig.buffer.clone();
        rig.gesture(&mut tool, &[(2, 2)]);
        assert!(rig.buffer.same_pixels(&before));
    }

    #[test]
    fn text_cancelled_by_host_without_ui() {
        let mut buffer = PixelBuffer::new(10, 10, WHITE).unwrap();
        let mut selection = Selection::new();
        let mut dialogs = NoDialogs;
        let mut tool = Tool::new(ToolKind::Text, &cfg());
        let mut ctx = ToolContext { buffer: &mut buffer, selection: &mut selection, dialogs: &mut dialogs, font: None };
        tool.press(&mut ctx, (1, 1));
        assert!(!buffer.is_modified());
    }

    #[test]
    fn configure_updates_only_accepted_fields() {
        let mut brush = Tool::new(ToolKind::Brush, &cfg());
        let next = ToolConfig { color: BLACK, brush_size: 0, ..cfg() };
        brush.configure(&next);
        match brush {
            Tool::Brush(s) => {
                assert_eq!(s.color, BLACK);
                assert_eq!(s.size, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        let mut eraser = Tool::new(ToolKind::Eraser, &cfg());
        eraser.configure(&next);
        match eraser {
            Tool::Eraser(s) => assert_eq!(s.color, WHITE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deactivate_drops_previews() {
        let mut rig = Rig::new(10, 10);
        let mut ellipse = Tool::new(ToolKind::Ellipse, &cfg());
        ellipse.press(&mut rig.ctx(), (1, 1));
        ellipse.drag(&mut rig.ctx(), (8, 8));
        ellipse.deactivate(&mut rig.selection);
        assert!(ellipse.preview().is_none());
        ellipse.release(&mut rig.ctx(), (8, 8));
        assert!(!rig.buffer.is_modified());

        let mut sel = Tool::new(ToolKind::Selection, &cfg());
        rig.gesture(&mut sel, &[(1, 1), (5, 5)]);
        sel.press(&mut rig.ctx(), (2, 2));
        sel.drag(&mut rig.ctx(), (7, 7));
        assert!(rig.selection.preview().is_some());
        sel.deactivate(&mut rig.selection);
        assert!(rig.selection.preview().is_none());
        assert_eq!(rig.selection.rect(), Some(Rect::new(1, 1, 5, 5)));
    }
}

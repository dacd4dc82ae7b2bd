use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;

use crate::canvas::Color;

// ============================================================================
// IMAGE FORMAT ENUM
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Png => "PNG",
            SaveFormat::Jpeg => "JPEG",
            SaveFormat::Bmp => "BMP",
        }
    }

    pub fn supports_quality(&self) -> bool {
        matches!(self, SaveFormat::Jpeg)
    }

    /// Case-insensitive lookup by name or file extension.
    pub fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<SaveFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_extension)
    }

    pub fn all() -> &'static [SaveFormat] {
        &[SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Bmp]
    }
}

// ============================================================================
// HOST DIALOGS — modal interactions supplied by the embedding UI
// ============================================================================

/// Result of the text-entry dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRequest {
    pub text: String,
    pub font_size: u32,
}

/// Modal interactions the core cannot perform itself. Every method is a
/// synchronous call; `None` means the user cancelled.
pub trait HostDialogs {
    /// Ask for the text to place and its size (pre-filled with `default_size`).
    fn request_text(&mut self, default_size: u32) -> Option<TextRequest>;

    /// Resolve the font to render text with. `None` selects the built-in font.
    fn resolve_font(&mut self) -> Option<FontArc> {
        None
    }

    fn pick_color(&mut self, _initial: Color) -> Option<Color> {
        None
    }

    fn pick_open_path(&mut self) -> Option<PathBuf> {
        None
    }

    fn pick_save_path(&mut self, _suggested: SaveFormat) -> Option<PathBuf> {
        None
    }
}

/// Host without any UI: every dialog is cancelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDialogs;

impl HostDialogs for NoDialogs {
    fn request_text(&mut self, _default_size: u32) -> Option<TextRequest> {
        None
    }
}

/// Pre-recorded answers, consumed in order. Used for batch runs and tests.
#[derive(Default)]
pub struct ScriptedDialogs {
    pub texts: VecDeque<Option<TextRequest>>,
    pub colors: VecDeque<Option<Color>>,
    pub paths: VecDeque<Option<PathBuf>>,
    pub font: Option<FontArc>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str, font_size: u32) -> Self {
        self.texts.push_back(Some(TextRequest { text: text.to_string(), font_size }));
        self
    }

    pub fn with_cancelled_text(mut self) -> Self {
        self.texts.push_back(None);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.colors.push_back(Some(color));
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push_back(Some(path.into()));
        self
    }
}

impl HostDialogs for ScriptedDialogs {
    fn request_text(&mut self, _default_size: u32) -> Option<TextRequest> {
        self.texts.pop_front().flatten()
    }

    fn resolve_font(&mut self) -> Option<FontArc> {
        self.font.clone()
    }

    fn pick_color(&mut self, _initial: Color) -> Option<Color> {
        self.colors.pop_front().flatten()
    }

    fn pick_open_path(&mut self) -> Option<PathBuf> {
        self.paths.pop_front().flatten()
    }

    fn pick_save_path(&mut self, _suggested: SaveFormat) -> Option<PathBuf> {
        self.paths.pop_front().flatten()
    }
}

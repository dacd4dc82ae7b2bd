use std::path::{Path, PathBuf};

use image::Rgba;

use crate::canvas::{BLACK, Color, WHITE};
use crate::components::tools::ToolConfig;
use crate::io::DEFAULT_JPEG_QUALITY;
use crate::{log_info, log_warn};

const SETTINGS_FILE_NAME: &str = "rasterly_settings.cfg";

/// Persisted editor preferences, stored as `key=value` lines.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    pub max_undo_steps: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: Color,
    pub foreground_color: Color,
    pub brush_size: u32,
    pub eraser_size: u32,
    pub line_width: u32,
    pub shape_fill: bool,
    pub fill_color: Color,
    pub font_size: u32,
    /// Empty = built-in font.
    pub font_path: String,
    /// Eraser paints transparency instead of the background colour.
    pub eraser_transparent: bool,
    pub jpeg_quality: u8,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_undo_steps: 50,
            canvas_width: 800,
            canvas_height: 600,
            background_color: WHITE,
            foreground_color: BLACK,
            brush_size: 5,
            eraser_size: 10,
            line_width: 2,
            shape_fill: false,
            fill_color: BLACK,
            font_size: 12,
            font_path: String::new(),
            eraser_transparent: false,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/rasterly/rasterly_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Rasterly\rasterly_settings.cfg
    /// On macOS:   ~/Library/Application Support/Rasterly/rasterly_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("Rasterly").join(SETTINGS_FILE_NAME));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Rasterly")
                    .join(SETTINGS_FILE_NAME),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(xdg) => PathBuf::from(xdg),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("rasterly").join(SETTINGS_FILE_NAME))
        }
    }

    /// Serialize a colour as "r,g,b,a"
    fn color_to_str(c: Color) -> String {
        format!("{},{},{},{}", c[0], c[1], c[2], c[3])
    }

    /// Parse a colour from "r,g,b,a"
    fn str_to_color(s: &str) -> Option<Color> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() == 4 {
            let r = parts[0].trim().parse::<u8>().ok()?;
            let g = parts[1].trim().parse::<u8>().ok()?;
            let b = parts[2].trim().parse::<u8>().ok()?;
            let a = parts[3].trim().parse::<u8>().ok()?;
            Some(Rgba([r, g, b, a]))
        } else {
            None
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_undo_steps={}\n\
             canvas_width={}\n\
             canvas_height={}\n\
             background_color={}\n\
             foreground_color={}\n\
             brush_size={}\n\
             eraser_size={}\n\
             line_width={}\n\
             shape_fill={}\n\
             fill_color={}\n\
             font_size={}\n\
             font_path={}\n\
             eraser_transparent={}\n\
             jpeg_quality={}\n",
            self.max_undo_steps,
            self.canvas_width,
            self.canvas_height,
            Self::color_to_str(self.background_color),
            Self::color_to_str(self.foreground_color),
            self.brush_size,
            self.eraser_size,
            self.line_width,
            self.shape_fill,
            Self::color_to_str(self.fill_color),
            self.font_size,
            self.font_path,
            self.eraser_transparent,
            self.jpeg_quality,
        )
    }

    /// Parse `key=value` lines. Unknown keys are ignored and unparsable
    /// values keep their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            let ok = match key {
                "max_undo_steps" => set_parsed(&mut s.max_undo_steps, val, |v| *v > 0),
                "canvas_width" => set_parsed(&mut s.canvas_width, val, |v| *v > 0),
                "canvas_height" => set_parsed(&mut s.canvas_height, val, |v| *v > 0),
                "brush_size" => set_parsed(&mut s.brush_size, val, |v| *v > 0),
                "eraser_size" => set_parsed(&mut s.eraser_size, val, |v| *v > 0),
                "line_width" => set_parsed(&mut s.line_width, val, |v| *v > 0),
                "font_size" => set_parsed(&mut s.font_size, val, |v| *v > 0),
                "jpeg_quality" => set_parsed(&mut s.jpeg_quality, val, |v| (1..=100).contains(v)),
                "shape_fill" => set_parsed(&mut s.shape_fill, val, |_| true),
                "eraser_transparent" => set_parsed(&mut s.eraser_transparent, val, |_| true),
                "background_color" => set_color(&mut s.background_color, val),
                "foreground_color" => set_color(&mut s.foreground_color, val),
                "fill_color" => set_color(&mut s.fill_color, val),
                "font_path" => {
                    s.font_path = val.to_string();
                    true
                }
                _ => true,
            };
            if !ok {
                log_warn!("settings: ignoring bad value {:?} for {}", val, key);
            }
        }
        s
    }

    /// Load from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                log_info!("settings: using defaults ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from the platform location.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Save to the platform location. Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("settings: failed to write {}: {}", path.display(), e);
        }
    }

    /// Initial drawing parameters for a session.
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            color: self.foreground_color,
            erase_color: if self.eraser_transparent {
                crate::canvas::TRANSPARENT
            } else {
                self.background_color
            },
            brush_size: self.brush_size,
            eraser_size: self.eraser_size,
            line_width: self.line_width,
            fill: self.shape_fill,
            fill_color: self.fill_color,
            font_size: self.font_size,
        }
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, val: &str, valid: impl Fn(&T) -> bool) -> bool {
    match val.parse::<T>() {
        Ok(v) if valid(&v) => {
            *slot = v;
            true
        }
        _ => false,
    }
}

fn set_color(slot: &mut Color, val: &str) -> bool {
    match EditorSettings::str_to_color(val) {
        Some(c) => {
            *slot = c;
            true
        }
        None => false,
    }
}

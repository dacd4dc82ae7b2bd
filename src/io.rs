use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageError, RgbaImage};

use crate::canvas::PixelBuffer;
use crate::components::dialogs::SaveFormat;
use crate::error::{EditorError, EditorResult};
use crate::log_err;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// ============================================================================
// LOADING
// ============================================================================

/// Decode any format the `image` codecs understand into an RGBA buffer.
pub fn load_image(path: &Path) -> EditorResult<PixelBuffer> {
    let img = image::open(path).map_err(|e| {
        log_err!("load {}: {}", path.display(), e);
        EditorError::io(path, e)
    })?;
    PixelBuffer::from_rgba_image(img.to_rgba8())
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode `image` as `format` into `writer`. JPEG drops alpha.
pub fn encode_image<W: Write>(
    image: &RgbaImage,
    writer: &mut W,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }
    Ok(())
}

/// Encode and write `buffer` to `path`.
pub fn save_image(buffer: &PixelBuffer, path: &Path, format: SaveFormat, quality: u8) -> EditorResult<()> {
    let write = || -> Result<(), ImageError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        encode_image(buffer.as_rgba_image(), &mut writer, format, quality)?;
        writer.flush()?;
        Ok(())
    };
    write().map_err(|e| {
        log_err!("save {}: {}", path.display(), e);
        EditorError::io(path, e)
    })
}

// ============================================================================
// FILE HANDLER
// ============================================================================

/// Remembers where the current document lives and how it was last saved.
#[derive(Clone, Debug)]
pub struct FileHandler {
    /// `None` for a new, never-saved document.
    pub current_path: Option<PathBuf>,
    pub last_format: SaveFormat,
    pub last_quality: u8,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            current_path: None,
            last_format: SaveFormat::Png,
            last_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.last_quality = quality.clamp(1, 100);
        self
    }

    pub fn has_current_path(&self) -> bool {
        self.current_path.is_some()
    }

    /// Load `path` and make it the current document location.
    pub fn open(&mut self, path: &Path) -> EditorResult<PixelBuffer> {
        let buffer = load_image(path)?;
        self.current_path = Some(path.to_path_buf());
        if let Some(format) = SaveFormat::from_path(path) {
            self.last_format = format;
        }
        Ok(buffer)
    }

    /// Save to `path`; the format comes from the extension, else the last
    /// format used.
    pub fn save_as(&mut self, buffer: &PixelBuffer, path: &Path) -> EditorResult<()> {
        let format = SaveFormat::from_path(path).unwrap_or(self.last_format);
        save_image(buffer, path, format, self.last_quality)?;
        self.current_path = Some(path.to_path_buf());
        self.last_format = format;
        Ok(())
    }

    /// Save to the current path with the last used settings.
    pub fn quick_save(&mut self, buffer: &PixelBuffer) -> EditorResult<()> {
        let Some(path) = self.current_path.clone() else {
            return Err(EditorError::io(Path::new("<untitled>"), "no file path set"));
        };
        save_image(buffer, &path, self.last_format, self.last_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Rect, WHITE};
    use image::Rgba;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(6, 4, WHITE).unwrap();
        buf.fill_region(Rect::new(0, 0, 3, 2), Rgba([200, 10, 10, 255]));
        buf.set_pixel(5, 3, Rgba([0, 0, 255, 100]));
        buf
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        let buf = sample();
        save_image(&buf, &path, SaveFormat::Png, 90).unwrap();
        let back = load_image(&path).unwrap();
        assert!(back.same_pixels(&buf));
        assert!(!back.is_modified());
    }

    #[test]
    fn jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        save_image(&sample(), &path, SaveFormat::Jpeg, 95).unwrap();
        let back = load_image(&path).unwrap();
        assert_eq!((back.width(), back.height()), (6, 4));
        assert!(back.as_raw().chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn bmp_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bmp");
        save_image(&sample(), &path, SaveFormat::Bmp, 0).unwrap();
        let back = load_image(&path).unwrap();
        assert_eq!((back.width(), back.height()), (6, 4));
        assert_eq!(back.get_pixel(0, 0), Some(Rgba([200, 10, 10, 255])));
    }

    #[test]
    fn missing_or_garbage_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_image(&dir.path().join("none.png")), Err(EditorError::Io { .. })));

        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not a png").unwrap();
        assert!(matches!(load_image(&junk), Err(EditorError::Io { .. })));

        let bad_dir = dir.path().join("no_such_dir").join("x.png");
        assert!(matches!(save_image(&sample(), &bad_dir, SaveFormat::Png, 90), Err(EditorError::Io { .. })));
    }

    #[test]
    fn file_handler_tracks_path_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut fh = FileHandler::new();
        assert!(fh.quick_save(&sample()).is_err());

        let path = dir.path().join("doc.bmp");
        fh.save_as(&sample(), &path).unwrap();
        assert_eq!(fh.last_format, SaveFormat::Bmp);
        assert_eq!(fh.current_path.as_deref(), Some(path.as_path()));
        fh.quick_save(&sample()).unwrap();

        let mut other = FileHandler::new();
        let buf = other.open(&path).unwrap();
        assert_eq!(buf.width(), 6);
        assert_eq!(other.last_format, SaveFormat::Bmp);
    }
}

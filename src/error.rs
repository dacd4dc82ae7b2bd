use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::canvas::Rect;

/// Every recoverable failure the editor core can report.
///
/// None of these are fatal: the session surfaces them to the user and keeps
/// the buffer in its pre-call state.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Non-positive (or overflowing) width/height for create/resize.
    #[error("invalid image dimensions {width}×{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Crop or selection rectangle entirely outside the buffer.
    #[error("region {rect} lies outside the image")]
    InvalidRegion { rect: Rect },

    /// Load/save failure: missing file, permissions, unsupported format, codec error.
    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// An operation that needs an active selection or a filled clipboard.
    #[error("{0}")]
    ToolMisuse(&'static str),
}

impl EditorError {
    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        EditorError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

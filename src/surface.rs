use crate::canvas::PixelBuffer;

/// Whatever shows the image to the user. The session calls `present` after
/// every event and every buffer-replacing operation and expects nothing back.
pub trait DisplaySurface {
    fn present(&mut self, frame: &PixelBuffer);
}

/// Discards every frame (headless runs).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl DisplaySurface for NullSurface {
    fn present(&mut self, _frame: &PixelBuffer) {}
}

/// Keeps a copy of the most recent frame.
#[derive(Clone, Debug, Default)]
pub struct FrameRecorder {
    last: Option<PixelBuffer>,
    frames: usize,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        self.last.as_ref()
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl DisplaySurface for FrameRecorder {
    fn present(&mut self, frame: &PixelBuffer) {
        // Copied so the caller is free to keep mutating its buffer.
        self.last = Some(frame.clone());
        self.frames += 1;
    }
}

use std::collections::VecDeque;

use crate::canvas::PixelBuffer;
use crate::log_info;

// ============================================================================
// SNAPSHOT — full-buffer copy taken before a state-changing action
// ============================================================================

/// Immutable deep copy of the buffer at one point in time.
#[derive(Clone, Debug)]
pub struct HistorySnapshot {
    pixels: PixelBuffer,
}

impl HistorySnapshot {
    pub fn capture(buffer: &PixelBuffer) -> Self {
        Self::from_buffer(buffer.clone())
    }

    /// Take ownership without copying.
    pub fn from_buffer(mut pixels: PixelBuffer) -> Self {
        pixels.set_modified(false);
        Self { pixels }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.pixels
    }

    pub fn matches(&self, buffer: &PixelBuffer) -> bool {
        self.pixels.same_pixels(buffer)
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

// ============================================================================
// HISTORY MANAGER — bounded undo/redo stacks
// ============================================================================

/// Undo/redo over full snapshots.
///
/// The undo stack holds past states only ("edits only" convention): it is
/// empty for a fresh document, and `can_undo` means at least one entry.
pub struct HistoryManager {
    undo_stack: VecDeque<HistorySnapshot>,
    redo_stack: VecDeque<HistorySnapshot>,
    max_history_size: usize,
    /// Running byte total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HistoryManager {
    /// A cap of 0 is raised to 1.
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history_size
    }

    pub fn set_max_history(&mut self, max: usize) {
        self.max_history_size = max.max(1);
        self.prune();
    }

    /// Record `buffer` as the state to return to on the next undo.
    ///
    /// Returns `false` without touching either stack when the buffer is
    /// identical to the current top of the undo stack.
    pub fn push_state(&mut self, buffer: &PixelBuffer) -> bool {
        if self.undo_stack.back().is_some_and(|top| top.matches(buffer)) {
            return false;
        }
        for snap in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        }
        let snap = HistorySnapshot::capture(buffer);
        self.total_memory += snap.memory_size();
        self.undo_stack.push_back(snap);
        self.prune();
        true
    }

    /// Swap `current` for the most recent past state. With nothing to undo,
    /// `current` comes straight back.
    pub fn undo(&mut self, current: PixelBuffer) -> PixelBuffer {
        match self.undo_stack.pop_back() {
            Some(prev) => {
                self.total_memory = self.total_memory.saturating_sub(prev.memory_size());
                let snap = HistorySnapshot::from_buffer(current);
                self.total_memory += snap.memory_size();
                self.redo_stack.push_back(snap);
                prev.into_buffer()
            }
            None => current,
        }
    }

    pub fn redo(&mut self, current: PixelBuffer) -> PixelBuffer {
        match self.redo_stack.pop_back() {
            Some(next) => {
                self.total_memory = self.total_memory.saturating_sub(next.memory_size());
                let snap = HistorySnapshot::from_buffer(current);
                self.total_memory += snap.memory_size();
                self.undo_stack.push_back(snap);
                self.prune();
                next.into_buffer()
            }
            None => current,
        }
    }

    /// Drop the top undo entry if it equals `current`, i.e. the gesture that
    /// pushed it changed nothing. Returns whether an entry was dropped.
    pub fn discard_if_unchanged(&mut self, current: &PixelBuffer) -> bool {
        if self.undo_stack.back().is_some_and(|top| top.matches(current)) {
            if let Some(snap) = self.undo_stack.pop_back() {
                self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
            }
            return true;
        }
        false
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Bytes of pixel data held by both stacks.
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Evict the oldest entries beyond the cap.
    fn prune(&mut self) {
        let mut evicted = 0;
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                evicted += 1;
            }
        }
        if evicted > 0 {
            log_info!("history: evicted {} oldest snapshot(s)", evicted);
        }
    }
}

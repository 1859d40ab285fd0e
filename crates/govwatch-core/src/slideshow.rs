//! Slideshow position over a list of reports.
//!
//! [`SlideCursor`] is the pure half of the slideshow: an index that wraps in
//! both directions. Timers live with the caller (see the `govwatch` crate's
//! `SlideshowController`).

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideCursor {
    index: usize,
    len: usize,
}

/// What a presentation layer needs to draw the slide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideshowState {
    pub index: usize,
    pub total: usize,
    pub timer_active: bool,
}

impl SlideshowState {
    /// One-based counter text, e.g. `2 / 5`.
    pub fn counter(&self) -> String {
        if self.total == 0 {
            "0 / 0".to_string()
        } else {
            format!("{} / {}", self.index + 1, self.total)
        }
    }
}

impl SlideCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether timed rotation makes sense for this list.
    pub fn can_rotate(&self) -> bool {
        self.len > 1
    }

    pub fn next(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = (self.index + 1) % self.len;
    }

    pub fn previous(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = (self.index + self.len - 1) % self.len;
    }

    /// Point at a new list of `len` items, starting from the first.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.index = 0;
    }

    /// Jump to `index` if it is in range. Returns whether the cursor moved.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }
}

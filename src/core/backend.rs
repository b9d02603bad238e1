//! Terminal backend abstraction
//!
//! The session and renderer only talk to the device through
//! [`TerminalBackend`]. Two implementations exist: [`CrosstermBackend`]
//! drives the real terminal, [`MemoryBackend`] keeps an in-memory cell grid
//! with curses-like failure semantics.
//!
//! [`CrosstermBackend`]: crate::core::crossterm_backend::CrosstermBackend
//! [`MemoryBackend`]: crate::core::memory::MemoryBackend

use std::io;

use bitflags::bitflags;
use thiserror::Error;

use crate::core::color::{ColorPair, PairId};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no terminal available: {0}")]
    NoTerminal(String),

    #[error("position ({row}, {col}) is outside the {cols}x{rows} display")]
    OutOfBounds { row: u16, col: u16, cols: u16, rows: u16 },

    /// The text was written but the cursor could not advance past the
    /// bottom-right cell.
    #[error("cursor cannot advance past the last cell ({row}, {col})")]
    CursorOverflow { row: u16, col: u16 },

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("color pair {0} rejected")]
    PairRejected(PairId),
}

bitflags! {
    /// Terminal-side attribute bits for one write
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct AttrMask: u16 {
        const BOLD      = 0b0001;
        const UNDERLINE = 0b0010;
        const BLINK     = 0b0100;
    }
}

impl AttrMask {
    /// Baseline mask with no attributes set
    pub const NORMAL: AttrMask = AttrMask::empty();
}

/// What the device reports about its color handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSupport {
    /// Terminal can display color at all
    pub has_colors: bool,
    /// Terminal allows defining custom color pairs
    pub can_change_color: bool,
    /// Highest pair id the device accepts
    pub max_pairs: u16,
}

impl ColorSupport {
    pub const fn monochrome() -> Self {
        Self {
            has_colors: false,
            can_change_color: false,
            max_pairs: 0,
        }
    }
}

/// Low-level operations on a character-cell display.
///
/// Coordinates are zero-based `(row, col)`. Writes are buffered until
/// [`flush`](TerminalBackend::flush).
pub trait TerminalBackend {
    /// Take control of the terminal (raw mode, alternate screen).
    fn acquire(&mut self) -> Result<(), BackendError>;

    /// Restore the terminal to the state found by `acquire`.
    fn release(&mut self) -> Result<(), BackendError>;

    /// Current size as `(cols, rows)`.
    fn size(&self) -> Result<(u16, u16), BackendError>;

    fn color_support(&self) -> ColorSupport;

    /// Switch the device into color mode.
    fn enable_colors(&mut self) -> Result<(), BackendError>;

    /// Make pair 0 resolve to the terminal's native colors.
    fn use_default_colors(&mut self) -> Result<(), BackendError>;

    fn init_pair(&mut self, id: PairId, pair: ColorPair) -> Result<(), BackendError>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), BackendError>;

    /// Blank the whole display.
    fn erase(&mut self) -> Result<(), BackendError>;

    fn move_to(&mut self, row: u16, col: u16) -> Result<(), BackendError>;

    /// Write `text` starting at `(row, col)` with the given attributes and
    /// color pair (`None` uses the default pair).
    fn put_str(
        &mut self,
        row: u16,
        col: u16,
        text: &str,
        attrs: AttrMask,
        pair: Option<PairId>,
    ) -> Result<(), BackendError>;

    /// Push everything written since the last flush to the display.
    fn flush(&mut self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_mask_is_empty() {
        assert!(AttrMask::NORMAL.is_empty());
        assert_eq!(AttrMask::NORMAL, AttrMask::default());
    }

    #[test]
    fn test_mask_bits_are_independent() {
        let all = AttrMask::BOLD | AttrMask::UNDERLINE | AttrMask::BLINK;
        assert_eq!(all.bits().count_ones(), 3);
        assert!(!AttrMask::BOLD.intersects(AttrMask::UNDERLINE | AttrMask::BLINK));
    }
}

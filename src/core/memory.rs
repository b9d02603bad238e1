//! In-memory terminal backend
//!
//! Keeps a cell grid and a log of every operation. Writes follow curses
//! semantics: text wraps at the right edge, and a write that fills the
//! bottom-right cell stores the glyph but still fails because the cursor
//! cannot advance. Used for headless rendering and as the test double.

use std::collections::HashMap;

use unicode_width::UnicodeWidthChar;

use crate::core::backend::{AttrMask, BackendError, ColorSupport, TerminalBackend};
use crate::core::color::{ColorPair, PairId, MAX_PAIRS};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Acquire,
    Release,
    EnableColors,
    UseDefaultColors,
    InitPair(PairId, ColorPair),
    CursorVisible(bool),
    Erase,
    MoveTo(u16, u16),
    Put {
        row: u16,
        col: u16,
        text: String,
        attrs: AttrMask,
        pair: Option<PairId>,
    },
    Flush,
}

/// A single grid cell. Wide glyphs leave an empty continuation cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    pub grapheme: String,
    pub attrs: AttrMask,
    pub pair: Option<PairId>,
}

impl Default for MemoryCell {
    fn default() -> Self {
        Self {
            grapheme: " ".to_string(),
            attrs: AttrMask::NORMAL,
            pair: None,
        }
    }
}

pub struct MemoryBackend {
    cols: u16,
    rows: u16,
    support: ColorSupport,
    cursor_hide_supported: bool,
    /// First pair id `init_pair` rejects
    pair_ceiling: u16,
    available: bool,
    acquired: bool,
    grid: Vec<Vec<MemoryCell>>,
    pairs: HashMap<PairId, ColorPair>,
    ops: Vec<Op>,
}

impl MemoryBackend {
    /// A color-capable display of the given size.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            support: ColorSupport {
                has_colors: true,
                can_change_color: true,
                max_pairs: MAX_PAIRS,
            },
            cursor_hide_supported: true,
            pair_ceiling: MAX_PAIRS + 1,
            available: true,
            acquired: false,
            grid: vec![vec![MemoryCell::default(); cols as usize]; rows as usize],
            pairs: HashMap::new(),
            ops: Vec::new(),
        }
    }

    pub fn with_color_support(mut self, support: ColorSupport) -> Self {
        self.support = support;
        self.pair_ceiling = support.max_pairs.saturating_add(1);
        self
    }

    /// Reject pair ids at or above `ceiling`, regardless of what is reported.
    pub fn with_pair_ceiling(mut self, ceiling: u16) -> Self {
        self.pair_ceiling = ceiling;
        self
    }

    /// Emulate a vt100-style terminal that cannot hide its cursor.
    pub fn without_cursor_hide(mut self) -> Self {
        self.cursor_hide_supported = false;
        self
    }

    /// Fail `acquire`, as when no terminal is attached.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Change the display size, as a resize would.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.grid = vec![vec![MemoryCell::default(); cols as usize]; rows as usize];
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn pair(&self, id: PairId) -> Option<ColorPair> {
        self.pairs.get(&id).copied()
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&MemoryCell> {
        self.grid.get(row as usize)?.get(col as usize)
    }

    /// Text of one row with trailing blanks removed.
    pub fn row_text(&self, row: u16) -> String {
        self.grid
            .get(row as usize)
            .map(|cells| {
                let line: String = cells.iter().map(|c| c.grapheme.as_str()).collect();
                line.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    /// The whole grid, one line per row.
    pub fn contents(&self) -> String {
        (0..self.rows)
            .map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn out_of_bounds(&self, row: u16, col: u16) -> BackendError {
        BackendError::OutOfBounds {
            row,
            col,
            cols: self.cols,
            rows: self.rows,
        }
    }
}

impl TerminalBackend for MemoryBackend {
    fn acquire(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::Acquire);
        if !self.available {
            return Err(BackendError::NoTerminal("memory backend unavailable".into()));
        }
        self.acquired = true;
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::Release);
        self.acquired = false;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), BackendError> {
        Ok((self.cols, self.rows))
    }

    fn color_support(&self) -> ColorSupport {
        self.support
    }

    fn enable_colors(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::EnableColors);
        if !self.support.has_colors {
            return Err(BackendError::Unsupported("colors"));
        }
        Ok(())
    }

    fn use_default_colors(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::UseDefaultColors);
        Ok(())
    }

    fn init_pair(&mut self, id: PairId, pair: ColorPair) -> Result<(), BackendError> {
        self.ops.push(Op::InitPair(id, pair));
        if id.0 >= self.pair_ceiling {
            return Err(BackendError::PairRejected(id));
        }
        self.pairs.insert(id, pair);
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), BackendError> {
        self.ops.push(Op::CursorVisible(visible));
        if !visible && !self.cursor_hide_supported {
            return Err(BackendError::Unsupported("cursor hiding"));
        }
        Ok(())
    }

    fn erase(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::Erase);
        for row in &mut self.grid {
            row.fill(MemoryCell::default());
        }
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<(), BackendError> {
        self.ops.push(Op::MoveTo(row, col));
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(row, col));
        }
        Ok(())
    }

    fn put_str(
        &mut self,
        row: u16,
        col: u16,
        text: &str,
        attrs: AttrMask,
        pair: Option<PairId>,
    ) -> Result<(), BackendError> {
        self.ops.push(Op::Put {
            row,
            col,
            text: text.to_string(),
            attrs,
            pair,
        });
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(row, col));
        }

        let (mut r, mut c) = (row as usize, col as usize);
        let (cols, rows) = (self.cols as usize, self.rows as usize);
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            // A glyph wider than the display fits on no row
            if width > cols {
                return Err(self.out_of_bounds(r as u16, c as u16));
            }
            if c >= cols || (width == 2 && c + 1 >= cols) {
                r += 1;
                c = 0;
            }
            if r >= rows {
                return Err(BackendError::CursorOverflow {
                    row: self.rows - 1,
                    col: self.cols - 1,
                });
            }
            self.grid[r][c] = MemoryCell {
                grapheme: ch.to_string(),
                attrs,
                pair,
            };
            if width == 2 {
                self.grid[r][c + 1] = MemoryCell {
                    grapheme: String::new(),
                    attrs,
                    pair,
                };
            }
            c += width;
        }

        // The glyph is stored, but the cursor has nowhere to go.
        if r == rows - 1 && c >= cols {
            return Err(BackendError::CursorOverflow {
                row: self.rows - 1,
                col: self.cols - 1,
            });
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        self.ops.push(Op::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_str_writes_cells() {
        let mut backend = MemoryBackend::new(10, 3);
        backend.put_str(1, 2, "hi", AttrMask::BOLD, None).unwrap();
        assert_eq!(backend.row_text(1), "  hi");
        assert_eq!(backend.cell(1, 2).unwrap().attrs, AttrMask::BOLD);
    }

    #[test]
    fn test_corner_write_stores_glyph_but_fails() {
        let mut backend = MemoryBackend::new(4, 2);
        let result = backend.put_str(1, 2, "xy", AttrMask::NORMAL, None);
        assert!(matches!(result, Err(BackendError::CursorOverflow { row: 1, col: 3 })));
        assert_eq!(backend.row_text(1), "  xy");
    }

    #[test]
    fn test_write_wraps_at_right_edge() {
        let mut backend = MemoryBackend::new(4, 3);
        backend.put_str(0, 2, "abcd", AttrMask::NORMAL, None).unwrap();
        assert_eq!(backend.row_text(0), "  ab");
        assert_eq!(backend.row_text(1), "cd");
    }

    #[test]
    fn test_out_of_bounds_write_fails() {
        let mut backend = MemoryBackend::new(4, 2);
        assert!(matches!(
            backend.put_str(2, 0, "x", AttrMask::NORMAL, None),
            Err(BackendError::OutOfBounds { row: 2, .. })
        ));
    }

    #[test]
    fn test_wide_glyph_takes_two_cells() {
        let mut backend = MemoryBackend::new(6, 2);
        backend.put_str(0, 0, "日本", AttrMask::NORMAL, None).unwrap();
        assert_eq!(backend.row_text(0), "日本");
        assert_eq!(backend.cell(0, 1).unwrap().grapheme, "");
        assert_eq!(backend.cell(0, 4).unwrap().grapheme, " ");
    }

    #[test]
    fn test_glyph_wider_than_display_fails() {
        let mut backend = MemoryBackend::new(1, 2);
        let result = backend.put_str(0, 0, "日", AttrMask::NORMAL, None);
        assert!(matches!(result, Err(BackendError::OutOfBounds { .. })));
        assert_eq!(backend.contents(), "\n");

        assert!(backend.put_str(0, 0, "a", AttrMask::NORMAL, None).is_ok());
        assert!(backend.put_str(0, 0, "a日", AttrMask::NORMAL, None).is_err());
        assert_eq!(backend.row_text(0), "a");
    }

    #[test]
    fn test_pair_ceiling() {
        let mut backend = MemoryBackend::new(4, 2).with_pair_ceiling(3);
        let pair = ColorPair::default();
        assert!(backend.init_pair(PairId(2), pair).is_ok());
        assert!(matches!(
            backend.init_pair(PairId(3), pair),
            Err(BackendError::PairRejected(PairId(3)))
        ));
    }

    #[test]
    fn test_erase_blanks_grid() {
        let mut backend = MemoryBackend::new(4, 2);
        backend.put_str(0, 0, "abc", AttrMask::NORMAL, None).unwrap();
        backend.erase().unwrap();
        assert_eq!(backend.contents(), "\n");
    }
}

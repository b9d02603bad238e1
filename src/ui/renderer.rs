//! Frame renderer
//!
//! Paints a [`Screen`] onto the session's terminal. Every frame is a full
//! repaint: erase, write each part at its cell position, flush once.
//!
//! Content larger than the terminal is clipped: lines below the last row are
//! skipped and text past the right edge is cut at a cell boundary. A single
//! failed write never aborts the frame. Failures on writes that touch the
//! bottom-right cell are the driver's known corner quirk and are dropped
//! silently; any other failure is logged and counted in [`FrameStats`].

use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::backend::{AttrMask, TerminalBackend};
use crate::core::color::PairId;
use crate::core::session::TerminalSession;
use crate::error::{Error, Result};
use crate::ui::screen::{Screen, Style};

/// Outcome of one [`FrameRenderer::safe_write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Failure on a write touching the bottom-right cell
    CornerQuirk,
    Failed,
}

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub parts_written: usize,
    pub corner_quirks: usize,
    pub failed_writes: usize,
    /// Parts skipped or truncated because they fell outside the terminal
    pub clipped_parts: usize,
}

/// Map style flags onto the terminal attribute mask.
pub fn convert_attributes(style: &Style) -> AttrMask {
    let mut attrs = AttrMask::NORMAL;
    if style.is_bold() {
        attrs |= AttrMask::BOLD;
    }
    if style.is_underline() {
        attrs |= AttrMask::UNDERLINE;
    }
    if style.is_blink() {
        attrs |= AttrMask::BLINK;
    }
    attrs
}

/// Whether a write of `width` cells at `(row, col)` reaches the last cell.
fn touches_corner(row: u16, col: u16, width: usize, cols: u16, rows: u16) -> bool {
    width > 0
        && rows > 0
        && row == rows - 1
        && col < cols
        && col as usize + width >= cols as usize
}

/// Longest prefix of `text` that fits in `max_width` cells.
fn clip_to_width(text: &str, max_width: usize) -> &str {
    let mut used = 0;
    for (index, ch) in text.char_indices() {
        let width = ch.width().unwrap_or(0);
        if used + width > max_width {
            return &text[..index];
        }
        used += width;
    }
    text
}

#[derive(Debug, Default)]
pub struct FrameRenderer {
    /// Terminal size the last oversize warning was issued for
    overflow_warned: Option<(u16, u16)>,
    overflow_warnings: usize,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oversize warnings logged so far; at most one per terminal size.
    pub fn overflow_warnings(&self) -> usize {
        self.overflow_warnings
    }

    /// Render one frame.
    ///
    /// An empty screen leaves the terminal untouched. Erase and flush
    /// failures are returned; per-part write failures are not.
    pub fn render<B: TerminalBackend>(
        &mut self,
        session: &mut TerminalSession<B>,
        screen: &Screen,
    ) -> Result<FrameStats> {
        let mut stats = FrameStats::default();
        if screen.is_empty() {
            return Ok(stats);
        }

        let (cols, rows) = session.size();
        self.check_overflow(screen, cols, rows);

        session.backend_mut().erase()?;
        if cols == 0 || rows == 0 {
            // Nothing is addressable; the whole screen is clipped
            stats.clipped_parts = screen.lines().iter().map(|l| l.parts().len()).sum();
            session.backend_mut().flush()?;
            return Ok(stats);
        }
        session.backend_mut().move_to(0, 0)?;

        for (row, line) in screen.lines().iter().enumerate() {
            if row >= rows as usize {
                stats.clipped_parts += line.parts().len();
                continue;
            }
            let row = row as u16;

            let mut col: usize = 0;
            for part in line.parts() {
                let attrs = convert_attributes(part.style());
                let width = part.width();

                if col >= cols as usize {
                    stats.clipped_parts += 1;
                } else {
                    let text = clip_to_width(part.text(), cols as usize - col);
                    if text.len() < part.text().len() {
                        stats.clipped_parts += 1;
                    }
                    match self.safe_write(session, row, col as u16, text, attrs, part.style().pair)
                    {
                        WriteOutcome::Written => stats.parts_written += 1,
                        WriteOutcome::CornerQuirk => {
                            stats.parts_written += 1;
                            stats.corner_quirks += 1;
                        }
                        WriteOutcome::Failed => stats.failed_writes += 1,
                    }
                }

                col += width;
            }
        }

        session.backend_mut().flush()?;
        Ok(stats)
    }

    /// Write `text` at `(row, col)`, absorbing failures.
    ///
    /// The driver rejects writes that leave the cursor past the bottom-right
    /// cell even though the glyph lands; those are reported as
    /// [`WriteOutcome::CornerQuirk`] without logging.
    pub fn safe_write<B: TerminalBackend>(
        &mut self,
        session: &mut TerminalSession<B>,
        row: u16,
        col: u16,
        text: &str,
        attrs: AttrMask,
        pair: Option<PairId>,
    ) -> WriteOutcome {
        let (cols, rows) = session.size();
        match session.backend_mut().put_str(row, col, text, attrs, pair) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                if touches_corner(row, col, text.width(), cols, rows) {
                    let quirk = Error::CornerWriteQuirk { row, col };
                    debug!("{} ({})", quirk, e);
                    WriteOutcome::CornerQuirk
                } else {
                    warn!(
                        "Write at ({}, {}) failed: {} (len {}, terminal {}x{})",
                        row,
                        col,
                        e,
                        text.len(),
                        cols,
                        rows
                    );
                    WriteOutcome::Failed
                }
            }
        }
    }

    /// Warn about clipping once per terminal size, however many frames
    /// at that size fit or overflow in between.
    fn check_overflow(&mut self, screen: &Screen, cols: u16, rows: u16) {
        let too_big = screen.height() > rows as usize || screen.width() > cols as usize;
        if !too_big || self.overflow_warned == Some((cols, rows)) {
            return;
        }
        warn!(
            "Screen {}x{} is larger than terminal {}x{}, clipping",
            screen.width(),
            screen.height(),
            cols,
            rows
        );
        self.overflow_warned = Some((cols, rows));
        self.overflow_warnings += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::Color;
    use crate::core::memory::{MemoryBackend, Op};
    use crate::core::pairs::ColorPairRegistry;
    use crate::ui::screen::{Line, Part};

    fn session(cols: u16, rows: u16) -> TerminalSession<MemoryBackend> {
        let mut session = TerminalSession::initialize(MemoryBackend::new(cols, rows)).unwrap();
        session.backend_mut().take_ops();
        session
    }

    fn puts(ops: &[Op]) -> Vec<(u16, u16, String, AttrMask)> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Put {
                    row,
                    col,
                    text,
                    attrs,
                    ..
                } => Some((*row, *col, text.clone(), *attrs)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_convert_attributes_all_combinations() {
        for bits in 0..8u8 {
            let (bold, underline, blink) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let mut style = Style::new();
            let mut expected = AttrMask::NORMAL;
            if bold {
                style = style.bold();
                expected |= AttrMask::BOLD;
            }
            if underline {
                style = style.underline();
                expected |= AttrMask::UNDERLINE;
            }
            if blink {
                style = style.blink();
                expected |= AttrMask::BLINK;
            }
            assert_eq!(convert_attributes(&style), expected, "flags {:03b}", bits);
        }
        assert_eq!(convert_attributes(&Style::new()), AttrMask::NORMAL);
    }

    #[test]
    fn test_convert_attributes_ignores_pair() {
        let style = Style::new().bold().with_pair(Some(PairId(7)));
        assert_eq!(convert_attributes(&style), AttrMask::BOLD);
    }

    #[test]
    fn test_empty_screen_touches_nothing() {
        let mut session = session(10, 3);
        let stats = FrameRenderer::new().render(&mut session, &Screen::new()).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert!(session.backend().ops().is_empty());
    }

    #[test]
    fn test_two_part_line() {
        let mut session = session(10, 3);
        let screen: Screen = vec![Line::new()
            .with(Part::plain("AB"))
            .with(Part::new("CD", Style::new().bold()))]
        .into();

        FrameRenderer::new().render(&mut session, &screen).unwrap();

        assert_eq!(
            session.backend().ops(),
            &[
                Op::Erase,
                Op::MoveTo(0, 0),
                Op::Put {
                    row: 0,
                    col: 0,
                    text: "AB".into(),
                    attrs: AttrMask::NORMAL,
                    pair: None,
                },
                Op::Put {
                    row: 0,
                    col: 2,
                    text: "CD".into(),
                    attrs: AttrMask::BOLD,
                    pair: None,
                },
                Op::Flush,
            ]
        );
        assert_eq!(session.backend().row_text(0), "ABCD");
    }

    #[test]
    fn test_writes_reconstruct_lines() {
        let mut session = session(20, 5);
        let screen: Screen = vec![
            Line::new()
                .with(Part::new("fn ", Style::new().bold()))
                .with(Part::plain("main"))
                .with(Part::new("()", Style::new().underline())),
            Line::new(),
            Line::new().with(Part::new("  }", Style::new().blink())),
        ]
        .into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.parts_written, 4);
        assert_eq!(stats.failed_writes, 0);

        let ops = session.backend().ops();
        let puts = puts(ops);
        for (row, line) in screen.lines().iter().enumerate() {
            let written: Vec<_> = puts.iter().filter(|p| p.0 as usize == row).collect();
            let text: String = written.iter().map(|p| p.2.as_str()).collect();
            let expected: String = line.parts().iter().map(Part::text).collect();
            assert_eq!(text, expected);
            for (put, part) in written.iter().zip(line.parts()) {
                assert_eq!(put.3, convert_attributes(part.style()));
            }
            assert_eq!(session.backend().row_text(row as u16), expected);
        }
        assert_eq!(ops.iter().filter(|op| **op == Op::Flush).count(), 1);
    }

    #[test]
    fn test_columns_advance_by_cell_width() {
        let mut session = session(30, 2);
        let screen: Screen = vec![Line::new()
            .with(Part::plain("abc"))
            .with(Part::new("日本", Style::new().bold()))
            .with(Part::plain(""))
            .with(Part::plain("z"))]
        .into();

        FrameRenderer::new().render(&mut session, &screen).unwrap();

        let cols: Vec<u16> = puts(session.backend().ops()).iter().map(|p| p.1).collect();
        assert_eq!(cols, vec![0, 3, 7, 7]);
    }

    #[test]
    fn test_corner_write_is_absorbed() {
        let mut session = session(4, 2);
        let screen: Screen = vec![
            Line::new().with(Part::plain("top")),
            Line::new().with(Part::plain("ab")).with(Part::plain("cd")),
        ]
        .into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.corner_quirks, 1);
        assert_eq!(stats.failed_writes, 0);
        assert_eq!(session.backend().row_text(1), "abcd");
        assert_eq!(session.backend().ops().last(), Some(&Op::Flush));
    }

    #[test]
    fn test_oversized_screen_is_clipped() {
        let mut session = session(5, 2);
        let screen: Screen = vec![
            Line::new().with(Part::plain("abc")).with(Part::plain("defgh")),
            Line::new().with(Part::plain("xy")),
            Line::new().with(Part::plain("hidden")),
        ]
        .into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.clipped_parts, 2);
        assert_eq!(stats.failed_writes, 0);
        assert_eq!(session.backend().contents(), "abcde\nxy");

        let puts = puts(session.backend().ops());
        assert_eq!(puts[1], (0, 3, "de".to_string(), AttrMask::NORMAL));
        assert!(puts.iter().all(|p| p.0 < 2));
    }

    #[test]
    fn test_oversize_warning_once_per_size() {
        let mut session = session(5, 2);
        let big: Screen = vec![
            Line::new().with(Part::plain("abcdefgh")),
            Line::new().with(Part::plain("xy")),
            Line::new().with(Part::plain("z")),
        ]
        .into();
        let small: Screen = vec![Line::new().with(Part::plain("ok"))].into();

        let mut renderer = FrameRenderer::new();
        for screen in [&big, &small, &big, &small, &big] {
            renderer.render(&mut session, screen).unwrap();
        }
        assert_eq!(renderer.overflow_warnings(), 1);

        // A new size gets its own warning
        session.backend_mut().resize(4, 2);
        session.query_dimensions().unwrap();
        renderer.render(&mut session, &small).unwrap();
        renderer.render(&mut session, &big).unwrap();
        renderer.render(&mut session, &big).unwrap();
        assert_eq!(renderer.overflow_warnings(), 2);
    }

    #[test]
    fn test_zero_size_terminal_clips_everything() {
        let mut session = session(0, 0);
        let screen: Screen = vec![
            Line::new().with(Part::plain("a")).with(Part::plain("b")),
            Line::new().with(Part::plain("c")),
        ]
        .into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.clipped_parts, 3);
        assert_eq!(stats.parts_written, 0);
        assert_eq!(session.backend().ops(), &[Op::Erase, Op::Flush]);
    }

    #[test]
    fn test_wide_glyph_not_split_at_edge() {
        let mut session = session(5, 2);
        let screen: Screen = vec![Line::new().with(Part::plain("abcd日"))].into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.clipped_parts, 1);
        assert_eq!(session.backend().row_text(0), "abcd");
    }

    #[test]
    fn test_other_write_failures_are_counted() {
        let mut session = session(5, 2);
        // Shrink the device behind the session's back: the cached size is stale
        session.backend_mut().resize(5, 1);
        let screen: Screen = vec![
            Line::new().with(Part::plain("one")),
            Line::new().with(Part::plain("two")),
        ]
        .into();

        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(stats.parts_written, 1);
        assert_eq!(stats.failed_writes, 1);
        assert_eq!(session.backend().ops().last(), Some(&Op::Flush));
    }

    #[test]
    fn test_pair_is_passed_through() {
        let mut session = session(10, 2);
        let style = Style::new().with_pair(Some(PairId(3)));
        let screen: Screen = vec![Line::new().with(Part::new("hi", style))].into();

        FrameRenderer::new().render(&mut session, &screen).unwrap();
        assert_eq!(session.backend().cell(0, 0).unwrap().pair, Some(PairId(3)));
    }

    #[test]
    fn test_unregistered_pair_renders_with_defaults() {
        let mut session = session(10, 2);
        let mut registry = ColorPairRegistry::new(4);
        let known = registry.register_pair(Color::Indexed(1), Color::Default).unwrap();
        registry.install(&mut session);

        let screen: Screen = vec![Line::new()
            .with(Part::new("a", Style::new().with_pair(Some(known))))
            .with(Part::new("b", Style::new().with_pair(Some(PairId(9)))))]
        .into();
        let stats = FrameRenderer::new().render(&mut session, &screen).unwrap();

        assert_eq!(stats.parts_written, 2);
        assert_eq!(stats.failed_writes, 0);
        let backend = session.backend();
        assert_eq!(backend.pair(known), registry.lookup(known));
        assert_eq!(backend.cell(0, 1).unwrap().pair, Some(PairId(9)));
        assert_eq!(backend.pair(PairId(9)), None);
    }

    #[test]
    fn test_touches_corner() {
        assert!(touches_corner(1, 2, 2, 4, 2));
        assert!(touches_corner(1, 3, 1, 4, 2));
        assert!(!touches_corner(1, 0, 3, 4, 2));
        assert!(!touches_corner(0, 2, 2, 4, 2));
        assert!(!touches_corner(1, 3, 0, 4, 2));
    }

    #[test]
    fn test_clip_to_width() {
        assert_eq!(clip_to_width("hello", 3), "hel");
        assert_eq!(clip_to_width("hello", 10), "hello");
        assert_eq!(clip_to_width("a日b", 2), "a");
        assert_eq!(clip_to_width("a日b", 3), "a日");
    }
}

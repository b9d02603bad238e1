//! Terminal backend using crossterm
//!
//! Commands are queued into a buffered stdout writer and reach the device on
//! `flush`. Each frame is wrapped in synchronized-update escapes so the
//! terminal never shows a half-drawn frame.

use std::collections::HashMap;
use std::env;
use std::io::{self, BufWriter, IsTerminal, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{
        self, Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::core::backend::{AttrMask, BackendError, ColorSupport, TerminalBackend};
use crate::core::color::{ColorPair, PairId, MAX_PAIRS};

const BEGIN_SYNC: &str = "\x1b[?2026h";
const END_SYNC: &str = "\x1b[?2026l";

pub struct CrosstermBackend {
    out: BufWriter<Stdout>,
    support: ColorSupport,
    /// crossterm has no pair table of its own
    pairs: HashMap<PairId, ColorPair>,
    acquired: bool,
    /// A synchronized update is open and waiting for `flush`
    frame_open: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self {
            out: BufWriter::with_capacity(65536, io::stdout()),
            support: detect_color_support(),
            pairs: HashMap::new(),
            acquired: false,
            frame_open: false,
        }
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        if !self.frame_open {
            write!(self.out, "{}", BEGIN_SYNC)?;
            self.frame_open = true;
        }
        Ok(())
    }

    fn apply_style(&mut self, attrs: AttrMask, pair: Option<PairId>) -> io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;

        if attrs.contains(AttrMask::BOLD) {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        if attrs.contains(AttrMask::UNDERLINE) {
            queue!(self.out, SetAttribute(Attribute::Underlined))?;
        }
        if attrs.contains(AttrMask::BLINK) {
            queue!(self.out, SetAttribute(Attribute::SlowBlink))?;
        }

        // Unknown pairs and pair 0 fall back to the terminal defaults
        if let Some(colors) = pair.and_then(|id| self.pairs.get(&id)).copied() {
            if !colors.fg.is_default() {
                queue!(self.out, SetForegroundColor(colors.fg.to_crossterm()))?;
            }
            if !colors.bg.is_default() {
                queue!(self.out, SetBackgroundColor(colors.bg.to_crossterm()))?;
            }
        }
        Ok(())
    }
}

impl TerminalBackend for CrosstermBackend {
    fn acquire(&mut self) -> Result<(), BackendError> {
        if !io::stdout().is_terminal() {
            return Err(BackendError::NoTerminal("stdout is not a terminal".into()));
        }
        terminal::enable_raw_mode()?;
        // Raw mode is on: from here release() has work to do
        self.acquired = true;
        if let Err(e) = enter_screen(&mut self.out) {
            let _ = self.release();
            return Err(e.into());
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        if !self.acquired {
            return Ok(());
        }
        self.acquired = false;

        if self.frame_open {
            let _ = write!(self.out, "{}", END_SYNC);
            self.frame_open = false;
        }
        let _ = execute!(
            self.out,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = self.out.flush();

        // Raw mode last: the most important part
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), BackendError> {
        Ok(terminal::size()?)
    }

    fn color_support(&self) -> ColorSupport {
        self.support
    }

    fn enable_colors(&mut self) -> Result<(), BackendError> {
        if !self.support.has_colors {
            return Err(BackendError::Unsupported("colors"));
        }
        Ok(())
    }

    fn use_default_colors(&mut self) -> Result<(), BackendError> {
        self.pairs.remove(&PairId::DEFAULT);
        queue!(self.out, ResetColor)?;
        Ok(())
    }

    fn init_pair(&mut self, id: PairId, pair: ColorPair) -> Result<(), BackendError> {
        if id == PairId::DEFAULT || id.0 > self.support.max_pairs {
            return Err(BackendError::PairRejected(id));
        }
        self.pairs.insert(id, pair);
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), BackendError> {
        if visible {
            execute!(self.out, Show)?;
        } else {
            execute!(self.out, Hide)?;
        }
        Ok(())
    }

    fn erase(&mut self) -> Result<(), BackendError> {
        self.begin_frame()?;
        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<(), BackendError> {
        self.begin_frame()?;
        queue!(self.out, MoveTo(col, row))?;
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
        self.begin_frame()?;
        queue!(self.out, MoveTo(col, row))?;
        self.apply_style(attrs, pair)?;
        queue!(self.out, Print(text))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
        if self.frame_open {
            write!(self.out, "{}", END_SYNC)?;
            self.frame_open = false;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Switch to the alternate screen with line wrap off and the cursor home.
fn enter_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(
        out,
        EnterAlternateScreen,
        DisableLineWrap,
        Clear(ClearType::All),
        MoveTo(0, 0)
    )
}

/// Detect color handling from the environment.
///
/// `NO_COLOR` forces monochrome. 256-color and truecolor terminals can take
/// custom pairs; plain 8/16-color terminals only get their basic palette.
fn detect_color_support() -> ColorSupport {
    if env::var_os("NO_COLOR").is_some() {
        return ColorSupport::monochrome();
    }

    let colors = style::available_color_count();
    let truecolor = matches!(
        env::var("COLORTERM").as_deref(),
        Ok("truecolor") | Ok("24bit")
    );
    let can_change_color = truecolor || colors >= 256;

    ColorSupport {
        has_colors: colors >= 8,
        can_change_color,
        max_pairs: if can_change_color {
            MAX_PAIRS
        } else {
            colors.min(MAX_PAIRS)
        },
    }
}

/// Put the terminal back into a usable state without a backend instance.
///
/// Used from the panic hook, where the backend may be borrowed mid-frame.
pub fn restore_terminal() {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{}", END_SYNC);
    let _ = execute!(
        stdout,
        ResetColor,
        SetAttribute(Attribute::Reset),
        Show,
        EnableLineWrap,
        LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts a fixed number of bytes, then fails every write.
    struct ShortWriter {
        room: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_enter_screen_sequence() {
        let mut out = Vec::new();
        enter_screen(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[?1049h"));
        assert!(text.contains("\x1b[?7l"));
        assert!(text.ends_with("\x1b[1;1H"));
    }

    #[test]
    fn test_enter_screen_reports_write_failure() {
        let mut out = ShortWriter { room: 4 };
        assert!(enter_screen(&mut out).is_err());
    }

    #[test]
    fn test_release_before_acquire_is_noop() {
        let mut backend = CrosstermBackend::new();
        assert!(!backend.acquired);
        assert!(backend.release().is_ok());
        assert!(!backend.frame_open);
    }
}

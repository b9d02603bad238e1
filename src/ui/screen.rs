//! Abstract screen model
//!
//! A [`Screen`] is what the display layer hands the renderer each frame:
//! ordered lines, each an ordered run of styled [`Part`]s. The renderer only
//! reads it.

use bitflags::bitflags;
use unicode_width::UnicodeWidthStr;

use crate::core::color::PairId;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        const BOLD      = 0b001;
        const UNDERLINE = 0b010;
        const BLINK     = 0b100;
    }
}

/// Style of one part: text attributes plus an optional color pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub flags: StyleFlags,
    pub pair: Option<PairId>,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            flags: StyleFlags::empty(),
            pair: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.flags |= StyleFlags::BOLD;
        self
    }

    pub fn underline(mut self) -> Self {
        self.flags |= StyleFlags::UNDERLINE;
        self
    }

    pub fn blink(mut self) -> Self {
        self.flags |= StyleFlags::BLINK;
        self
    }

    pub fn with_pair(mut self, pair: Option<PairId>) -> Self {
        self.pair = pair;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.flags.contains(StyleFlags::BOLD)
    }

    pub fn is_underline(&self) -> bool {
        self.flags.contains(StyleFlags::UNDERLINE)
    }

    pub fn is_blink(&self) -> bool {
        self.flags.contains(StyleFlags::BLINK)
    }
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    text: String,
    style: Style,
}

impl Part {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Width in terminal cells
    pub fn width(&self) -> usize {
        self.text.width()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    parts: Vec<Part>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn with(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn width(&self) -> usize {
        self.parts.iter().map(Part::width).sum()
    }
}

impl From<Vec<Part>> for Line {
    fn from(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

impl FromIterator<Part> for Line {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    lines: Vec<Line>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Width of the widest line, in cells
    pub fn width(&self) -> usize {
        self.lines.iter().map(Line::width).max().unwrap_or(0)
    }
}

impl From<Vec<Line>> for Screen {
    fn from(lines: Vec<Line>) -> Self {
        Self { lines }
    }
}

impl FromIterator<Line> for Screen {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_queries() {
        let style = Style::new().bold().blink();
        assert!(style.is_bold());
        assert!(!style.is_underline());
        assert!(style.is_blink());
        assert_eq!(Style::new(), Style::default());
    }

    #[test]
    fn test_widths_count_cells() {
        let line = Line::new()
            .with(Part::plain("ab"))
            .with(Part::plain("日本"));
        assert_eq!(line.parts()[1].width(), 4);
        assert_eq!(line.width(), 6);

        let screen: Screen = vec![line, Line::new().with(Part::plain("x"))].into();
        assert_eq!(screen.height(), 2);
        assert_eq!(screen.width(), 6);
    }

    #[test]
    fn test_empty_screen() {
        let screen = Screen::new();
        assert!(screen.is_empty());
        assert_eq!(screen.width(), 0);
    }
}

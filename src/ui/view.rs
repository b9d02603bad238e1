//! Scrolling document view
//!
//! Turns a text document into a [`Screen`] sized to the terminal: a line
//! number gutter, the visible slice of the document, `~` filler rows past
//! the end, and a status line on the last row.

use unicode_width::UnicodeWidthStr;

use crate::config::Palette;
use crate::ui::screen::{Line, Part, Screen};

const TAB_WIDTH: usize = 4;

pub struct DocumentView {
    name: String,
    lines: Vec<String>,
    /// Index of the first visible line
    offset: usize,
}

impl DocumentView {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            lines: text.lines().map(printable).collect(),
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Scroll by `delta` lines, keeping at least one line on screen.
    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1);
        self.offset = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            (self.offset + delta as usize).min(max)
        };
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    /// Build the frame for a `cols` x `rows` terminal.
    pub fn build_screen(&self, cols: u16, rows: u16, palette: &Palette) -> Screen {
        let mut screen = Screen::new();
        if rows == 0 || cols == 0 {
            return screen;
        }

        let body_rows = rows as usize - 1;
        let gutter = self.lines.len().max(1).to_string().len();

        for i in 0..body_rows {
            let index = self.offset + i;
            let line = match self.lines.get(index) {
                Some(text) => Line::new()
                    .with(Part::new(
                        format!("{:>width$} ", index + 1, width = gutter),
                        palette.style("line-number"),
                    ))
                    .with(Part::new(text.as_str(), palette.style("text"))),
                None => Line::new().with(Part::new("~", palette.style("filler"))),
            };
            screen.push_line(line);
        }

        screen.push_line(self.status_line(cols as usize, palette));
        screen
    }

    /// Status bar spanning the full width, so it always ends in the
    /// bottom-right cell.
    fn status_line(&self, cols: usize, palette: &Palette) -> Line {
        let mode = Part::new(" VIEW ", palette.style("status-mode").bold());
        let name = format!(" {}", self.name);
        let position = format!(
            "{}/{} ",
            (self.offset + 1).min(self.lines.len()),
            self.lines.len()
        );

        let used = mode.width() + name.width() + position.width();
        let fill = cols.saturating_sub(used);
        Line::new()
            .with(mode)
            .with(Part::new(
                format!("{}{}", name, " ".repeat(fill)),
                palette.style("status"),
            ))
            .with(Part::new(position, palette.style("status")))
    }
}

/// Expand tabs and replace other control characters, which would reach the
/// terminal as raw escapes and take no cells.
fn printable(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
            c if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    out
}

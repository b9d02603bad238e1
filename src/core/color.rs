//! Colors and color pairs.
//!
//! A color pair is the unit of colored styling: a (foreground, background)
//! combination addressed by a small integer id. Pair 0 always means the
//! terminal's own default colors.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Upper bound on pair ids any backend reports.
pub const MAX_PAIRS: u16 = 256;

/// Color definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Color {
    /// The terminal's native default (inherits the user's palette)
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

const ANSI_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

impl Color {
    /// Convert to crossterm color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        match self {
            Color::Default => crossterm::style::Color::Reset,
            Color::Indexed(n) => crossterm::style::Color::AnsiValue(n),
            Color::Rgb(r, g, b) => crossterm::style::Color::Rgb { r, g, b },
        }
    }

    pub fn is_default(self) -> bool {
        self == Color::Default
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `default`, an ANSI name (`red`, `bright-blue`), a palette
    /// index (`0`..`255`) or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "default" || s == "-1" {
            return Ok(Color::Default);
        }
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("invalid hex color: #{}", hex));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("invalid hex color: #{}", hex))
            };
            return Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        if let Ok(index) = s.parse::<u8>() {
            return Ok(Color::Indexed(index));
        }
        let (name, offset) = match s
            .strip_prefix("bright-")
            .or_else(|| s.strip_prefix("bright_"))
        {
            Some(rest) => (rest, 8),
            None => (s.as_str(), 0),
        };
        ANSI_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Color::Indexed(i as u8 + offset))
            .ok_or_else(|| format!("unknown color: {}", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Default => write!(f, "default"),
            Color::Indexed(n) => write!(f, "{}", n),
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

/// A (foreground, background) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

impl ColorPair {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }
}

/// Identifier of a registered color pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub u16);

impl PairId {
    /// The terminal's default pair; never allocated by the registry.
    pub const DEFAULT: PairId = PairId(0);
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//! Configuration and theme management for termframe.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termframe/config.toml`
//! - Built-in themes mapping style roles to color pairs
//! - The color setup hook that registers a theme's pairs with a session
//!
//! # Configuration File
//!
//! ```toml
//! log_level = "debug"
//! hide_cursor = true
//!
//! # Theme: default, solarized-dark, monokai, nord
//! theme = "nord"
//!
//! # Extra or overriding pairs, by role name
//! [[pairs]]
//! name = "status"
//! fg = "#ffffff"
//! bg = "bright-blue"
//! ```
//!
//! Colors are `default`, an ANSI name (`red`, `bright-blue`), a palette index
//! (`0`-`255`) or `#rrggbb`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::core::backend::TerminalBackend;
use crate::core::color::{Color, ColorPair, PairId};
use crate::core::pairs::ColorPairRegistry;
use crate::core::session::TerminalSession;
use crate::error::{Error, Result};
use crate::ui::screen::Style;

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Hide the terminal cursor while rendering
    pub hide_cursor: bool,
    /// Built-in theme name
    pub theme: String,
    /// Extra pairs layered over the theme
    pub pairs: Vec<PairConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            hide_cursor: true,
            theme: "default".to_string(),
            pairs: Vec::new(),
        }
    }
}

/// A named pair from the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    pub name: String,
    #[serde(default)]
    pub fg: Color,
    #[serde(default)]
    pub bg: Color,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is
    /// an error so the caller can report it.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::get_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// The configured theme with the extra pairs applied.
    pub fn theme(&self) -> Theme {
        let mut theme = Theme::by_name(&self.theme);
        for pair in &self.pairs {
            theme.set(&pair.name, ColorPair::new(pair.fg, pair.bg));
        }
        theme
    }
}

/// Style roles mapped to color pairs
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    entries: Vec<(String, ColorPair)>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

fn entries(list: &[(&str, Color, Color)]) -> Vec<(String, ColorPair)> {
    list.iter()
        .map(|(name, fg, bg)| (name.to_string(), ColorPair::new(*fg, *bg)))
        .collect()
}

impl Theme {
    /// Terminal palette colors; inherits the user's scheme
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            entries: entries(&[
                ("text", Color::Default, Color::Default),
                ("line-number", Color::Indexed(8), Color::Default),
                ("filler", Color::Indexed(4), Color::Default),
                ("status", Color::Indexed(0), Color::Indexed(7)),
                ("status-mode", Color::Indexed(15), Color::Indexed(4)),
            ]),
        }
    }

    /// Solarized Dark theme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            entries: entries(&[
                ("text", Color::Rgb(131, 148, 150), Color::Rgb(0, 43, 54)),
                ("line-number", Color::Rgb(88, 110, 117), Color::Rgb(7, 54, 66)),
                ("filler", Color::Rgb(38, 139, 210), Color::Rgb(0, 43, 54)),
                ("status", Color::Rgb(147, 161, 161), Color::Rgb(7, 54, 66)),
                ("status-mode", Color::Rgb(253, 246, 227), Color::Rgb(38, 139, 210)),
            ]),
        }
    }

    /// Monokai theme
    pub fn monokai() -> Self {
        Self {
            name: "monokai".to_string(),
            entries: entries(&[
                ("text", Color::Rgb(248, 248, 242), Color::Rgb(39, 40, 34)),
                ("line-number", Color::Rgb(144, 144, 138), Color::Rgb(39, 40, 34)),
                ("filler", Color::Rgb(117, 113, 94), Color::Rgb(39, 40, 34)),
                ("status", Color::Rgb(248, 248, 242), Color::Rgb(60, 60, 54)),
                ("status-mode", Color::Rgb(39, 40, 34), Color::Rgb(166, 226, 46)),
            ]),
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            entries: entries(&[
                ("text", Color::Rgb(216, 222, 233), Color::Rgb(46, 52, 64)),
                ("line-number", Color::Rgb(76, 86, 106), Color::Rgb(46, 52, 64)),
                ("filler", Color::Rgb(94, 129, 172), Color::Rgb(46, 52, 64)),
                ("status", Color::Rgb(216, 222, 233), Color::Rgb(59, 66, 82)),
                ("status-mode", Color::Rgb(46, 52, 64), Color::Rgb(136, 192, 208)),
            ]),
        }
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" => Self::solarized_dark(),
            "monokai" => Self::monokai(),
            "nord" => Self::nord(),
            _ => Self::default_theme(),
        }
    }

    /// List available themes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "monokai", "nord"]
    }

    /// Replace the pair for `name`, or add it.
    pub fn set(&mut self, name: &str, pair: ColorPair) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = pair,
            None => self.entries.push((name.to_string(), pair)),
        }
    }

    pub fn get(&self, name: &str) -> Option<ColorPair> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| *p)
    }

    /// Register every role's pair. Roles that don't fit in the registry are
    /// logged and left unstyled.
    pub fn register(&self, registry: &mut ColorPairRegistry) -> Palette {
        let mut palette = Palette::default();
        for (name, pair) in &self.entries {
            match registry.register_pair(pair.fg, pair.bg) {
                Ok(id) => {
                    palette.ids.insert(name.clone(), id);
                }
                Err(e) => warn!("Theme role '{}' left unstyled: {}", name, e),
            }
        }
        palette
    }

    /// Color setup hook for [`TerminalSession::init_colors_with`]: builds a
    /// registry sized to the terminal, registers the theme and installs it.
    pub fn setup<B: TerminalBackend>(
        &self,
        session: &mut TerminalSession<B>,
        max_pairs: u16,
    ) -> (ColorPairRegistry, Palette) {
        let mut registry = ColorPairRegistry::new(max_pairs);
        let palette = self.register(&mut registry);
        registry.install(session);
        (registry, palette)
    }
}

/// Role name to registered pair id
#[derive(Debug, Clone, Default)]
pub struct Palette {
    ids: HashMap<String, PairId>,
}

impl Palette {
    pub fn pair(&self, role: &str) -> Option<PairId> {
        self.ids.get(role).copied()
    }

    /// Plain style carrying the role's pair, or no pair if unregistered.
    pub fn style(&self, role: &str) -> Style {
        Style::new().with_pair(self.pair(role))
    }
}

/// `~/.termframe`, created on demand
pub fn config_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".termframe");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

//! Terminal session management
//!
//! A [`TerminalSession`] owns the backend for the lifetime of the program:
//! it acquires the terminal, tracks its size, sets up colors and the cursor,
//! and restores everything on shutdown. Dropping the session shuts it down,
//! so every exit path releases the terminal.

use tracing::{debug, info, warn};

use crate::core::backend::{ColorSupport, TerminalBackend};
use crate::error::{Error, Result};

/// Color capabilities found by [`TerminalSession::init_colors`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCapabilities {
    pub has_colors: bool,
    pub can_change_color: bool,
    /// Pairs the registry may allocate (0 when pairs are unavailable)
    pub max_pairs: u16,
}

impl Default for ColorCapabilities {
    fn default() -> Self {
        Self::from(ColorSupport::monochrome())
    }
}

impl From<ColorSupport> for ColorCapabilities {
    fn from(support: ColorSupport) -> Self {
        Self {
            has_colors: support.has_colors,
            can_change_color: support.can_change_color,
            max_pairs: if support.can_change_color {
                support.max_pairs
            } else {
                0
            },
        }
    }
}

pub struct TerminalSession<B: TerminalBackend> {
    backend: B,
    cols: u16,
    rows: u16,
    capabilities: ColorCapabilities,
    cursor_hidden: bool,
    active: bool,
}

impl<B: TerminalBackend> TerminalSession<B> {
    /// Acquire the terminal and read its size.
    ///
    /// Failure here is fatal: nothing can be rendered without a terminal.
    /// A backend that fails partway through `acquire` is released before
    /// the error is returned.
    pub fn initialize(mut backend: B) -> Result<Self> {
        if let Err(e) = backend.acquire() {
            let _ = backend.release();
            return Err(Error::Fatal(e));
        }
        let (cols, rows) = match backend.size() {
            Ok(size) => size,
            Err(e) => {
                let _ = backend.release();
                return Err(Error::Fatal(e));
            }
        };

        info!("Terminal session started ({}x{})", cols, rows);
        Ok(Self {
            backend,
            cols,
            rows,
            capabilities: ColorCapabilities::default(),
            cursor_hidden: false,
            active: true,
        })
    }

    /// Re-read the terminal size. Call on every resize event.
    pub fn query_dimensions(&mut self) -> Result<(u16, u16)> {
        let (cols, rows) = self.backend.size()?;
        self.cols = cols;
        self.rows = rows;
        debug!("Terminal size: {}x{}", cols, rows);
        Ok((cols, rows))
    }

    /// Last size read, as `(cols, rows)`.
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Set up the color subsystem. Never fails; missing color support
    /// degrades to the terminal's default colors.
    pub fn init_colors(&mut self) -> ColorCapabilities {
        self.init_colors_with(|_, _| {})
    }

    /// Like [`init_colors`](Self::init_colors), then run `setup` to register
    /// pairs when the terminal accepts custom pairs.
    pub fn init_colors_with<F>(&mut self, setup: F) -> ColorCapabilities
    where
        F: FnOnce(&mut Self, &ColorCapabilities),
    {
        let support = self.backend.color_support();
        let mut capabilities = ColorCapabilities::from(support);

        if support.can_change_color {
            debug!("Terminal supports changing colors");
            debug!("Max color pairs: {}", support.max_pairs);
            if let Err(e) = self.backend.enable_colors() {
                warn!("Enabling colors failed: {}", e);
                capabilities = ColorCapabilities {
                    has_colors: false,
                    ..ColorCapabilities::default()
                };
            }
            self.use_default_colors();
            self.capabilities = capabilities;
            if capabilities.can_change_color {
                setup(self, &capabilities);
            }
        } else {
            self.use_default_colors();
            self.capabilities = capabilities;
            debug!("Terminal doesn't support changing colors");
        }

        capabilities
    }

    fn use_default_colors(&mut self) {
        if let Err(e) = self.backend.use_default_colors() {
            warn!("Enabling default colors failed: {}", e);
        }
    }

    pub fn capabilities(&self) -> ColorCapabilities {
        self.capabilities
    }

    pub fn has_colors(&self) -> bool {
        self.backend.color_support().has_colors
    }

    /// Show or hide the cursor. Best-effort: some terminals can't hide it,
    /// in which case it stays visible. Returns whether the change applied.
    pub fn set_cursor_visibility(&mut self, visible: bool) -> bool {
        match self.backend.set_cursor_visible(visible) {
            Ok(()) => {
                self.cursor_hidden = !visible;
                true
            }
            Err(e) => {
                warn!(
                    "{} cursor failed: {}",
                    if visible { "Showing" } else { "Hiding" },
                    e
                );
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Restore the terminal. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if self.cursor_hidden {
            self.set_cursor_visibility(true);
        }
        if let Err(e) = self.backend.release() {
            warn!("Terminal restore failed: {}", e);
        }
        info!("Terminal session ended");
    }
}

impl<B: TerminalBackend> Drop for TerminalSession<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! termframe - full-frame terminal renderer
//!
//! Paints an abstract screen (lines of styled text parts) onto a terminal.
//!
//! # Components
//!
//! - **Terminal session** ([`core::session`]): owns the terminal, reads its
//!   size, sets up colors and the cursor, restores it on every exit path
//! - **Color pair registry** ([`core::pairs`]): bounded (fg, bg) pair ids
//! - **Frame renderer** ([`ui::renderer`]): erase, write, flush per frame
//!
//! # Example
//!
//! ```
//! use termframe::core::memory::MemoryBackend;
//! use termframe::core::session::TerminalSession;
//! use termframe::ui::{FrameRenderer, Line, Part, Screen, Style};
//!
//! let mut session = TerminalSession::initialize(MemoryBackend::new(20, 2)).unwrap();
//! session.init_colors();
//!
//! let screen: Screen = vec![Line::new()
//!     .with(Part::plain("hello "))
//!     .with(Part::new("world", Style::new().bold()))]
//! .into();
//! FrameRenderer::new().render(&mut session, &screen).unwrap();
//!
//! assert_eq!(session.backend().row_text(0), "hello world");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod ui;

pub use error::{Error, Result};

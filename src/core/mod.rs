//! Terminal device layer.
//!
//! - **backend**: `TerminalBackend` trait, attribute mask, backend errors
//! - **crossterm_backend**: the real terminal via crossterm
//! - **memory**: in-memory cell grid with curses-like write semantics
//! - **color**: colors, color pairs and pair ids
//! - **pairs**: color pair registry and capability probe
//! - **session**: terminal session lifecycle (size, colors, cursor, restore)
//!
//! # Architecture
//!
//! ```text
//! TerminalSession<B: TerminalBackend>
//! ├── CrosstermBackend (real terminal)
//! └── MemoryBackend    (headless / tests)
//!
//! ColorPairRegistry ──install──> TerminalSession
//! ```

pub mod backend;
pub mod color;
pub mod crossterm_backend;
pub mod memory;
pub mod pairs;
pub mod session;

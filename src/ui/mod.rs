//! Screen model and rendering.
//!
//! - **screen**: lines of styled parts handed to the renderer
//! - **renderer**: full-frame renderer with clipping and corner-write handling
//! - **view**: scrolling document view that builds screens for the binary

pub mod renderer;
pub mod screen;
pub mod view;

pub use renderer::{convert_attributes, FrameRenderer, FrameStats, WriteOutcome};
pub use screen::{Line, Part, Screen, Style, StyleFlags};
pub use view::DocumentView;

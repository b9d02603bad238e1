//! Error types for the rendering core.
//!
//! Only `Fatal` stops the program. The other variants name conditions the
//! caller may want to log or react to; the renderer itself absorbs
//! `CornerWriteQuirk` and per-cell write failures without surfacing them.

use thiserror::Error;

use crate::core::backend::BackendError;

#[derive(Error, Debug)]
pub enum Error {
    /// A write touching the bottom-right cell was rejected by the driver.
    #[error("write touching the bottom-right cell ({row}, {col}) was rejected")]
    CornerWriteQuirk { row: u16, col: u16 },

    /// No more distinct color pairs fit in the terminal's pair table.
    #[error("color pair capacity exceeded (max {max} pairs)")]
    CapacityExceeded { max: u16 },

    /// The terminal does not support an optional capability.
    #[error("unsupported terminal capability: {0}")]
    Unsupported(&'static str),

    /// The terminal could not be acquired; nothing can be rendered.
    #[error("fatal terminal error: {0}")]
    Fatal(#[source] BackendError),

    /// A frame-level operation (erase, flush) failed.
    #[error("terminal backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the crate.

use thiserror::Error;

/// Every failure the library reports. Each one is scoped to the call that
/// produced it; nothing here is fatal to the host process.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid board size {size} (must be 1-{max})")]
    InvalidSize { size: usize, max: usize },

    #[error("coordinate {value} is out of range for a {size}x{size} board")]
    OutOfRange { value: String, size: usize },

    #[error("feature buffer has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        got: [usize; 3],
    },

    #[error("{0}")]
    IllegalMove(String),

    #[error("engine not supported: {0}")]
    UnsupportedEngine(String),

    #[error("{0}")]
    InvalidTimeSpec(String),

    #[error("corrupt trajectory stream at byte {offset}: {reason}")]
    CorruptStream { offset: usize, reason: String },

    #[error("{what} {value} does not fit in one byte")]
    ValueOutOfRange { what: &'static str, value: usize },

    #[error("trajectory starts from {stones} setup stones, but only empty-board starts can be stored")]
    SetupStones { stones: usize },

    #[error("unrecognized game record node {index}: {node}")]
    UnrecognizedNode { index: usize, node: String },

    #[error("game record syntax error at byte {offset}: {reason}")]
    SgfSyntax { offset: usize, reason: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn out_of_range(value: impl ToString, size: usize) -> Self {
        Error::OutOfRange {
            value: value.to_string(),
            size,
        }
    }

    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Error::CorruptStream {
            offset,
            reason: reason.into(),
        }
    }
}

//! Error types for the flip engine.

use thiserror::Error;

/// Errors produced by the flip engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlipError {
    /// The fold line could not be constructed (control point on the corner,
    /// or the line misses the page). Recovered locally as progress 0.
    #[error("degenerate fold: control point does not produce a fold line")]
    DegenerateFold,

    #[error("page index {index} out of range for book with {page_count} pages")]
    IndexOutOfRange { index: usize, page_count: usize },

    #[error("invalid page size {width}x{height}")]
    InvalidPageRect { width: f32, height: f32 },

    #[error("a book needs at least one page")]
    EmptyBook,

    #[error("unknown flip option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for flip option '{name}'")]
    InvalidOptionValue { name: String, value: String },
}

/// Result type for flip engine operations.
pub type FlipResult<T> = Result<T, FlipError>;

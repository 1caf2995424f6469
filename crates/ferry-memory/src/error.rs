//! Error types for memory view operations.

use thiserror::Error;

/// Errors raised by bounds-checked memory access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The requested range does not fit inside the view's current window.
    #[error("{label} memory access out of bounds: offset={offset}, len={len}, memory_size={size}")]
    OutOfBounds {
        /// Label of the view that rejected the access.
        label: &'static str,
        /// The offset attempted.
        offset: u64,
        /// The length attempted.
        len: u64,
        /// The view's current window size in bytes.
        size: u64,
    },

    /// A character outside the single-byte range was passed to `write_string`.
    #[error("{label} string marshaling: character {ch:?} (code point {code:#x}) does not fit in one byte")]
    WideCharacter {
        /// Label of the view that rejected the write.
        label: &'static str,
        /// The offending character.
        ch: char,
        /// Its code point.
        code: u32,
    },

    /// Source and destination of a cross-module copy resolve to the same module.
    #[error("aliased copy: source and destination are both '{label}'")]
    AliasedCopy {
        /// The shared label.
        label: &'static str,
    },
}

/// Result type for memory view operations.
pub type AccessResult<T> = std::result::Result<T, AccessError>;

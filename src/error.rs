//! Error types for segmentation and table operations.

use crate::store::{StoreId, StringId};
use thiserror::Error;

/// The main error type for segtable operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A string id is not registered in the store.
    #[error("String not found in store: {0}")]
    NotFound(StringId),

    /// Segment offsets fall outside the referenced string.
    #[error("Offsets out of range: {start}..{end} for a string of length {len}")]
    Range {
        /// Start offset that was requested.
        start: usize,
        /// End offset that was requested.
        end: usize,
        /// Length of the string, in bytes.
        len: usize,
    },

    /// An offset splits a UTF-8 encoded character.
    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    /// A segmentation references a store that the given store does not cover.
    #[error("Segmentation belongs to store {found}, which is not covered by store {expected}")]
    IncompatibleStore {
        /// Store the operation was run against.
        expected: StoreId,
        /// Store the segmentation belongs to.
        found: StoreId,
    },

    /// The same annotation key was supplied twice.
    #[error("Duplicate annotation key: {0}")]
    DuplicateAnnotationKey(String),

    /// An explicit string id already holds different content.
    #[error("String {0} is already registered with different content")]
    ContentConflict(StringId),

    /// A delimiter cannot be used for splitting.
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// An argument is outside its accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires non-overlapping segments.
    #[error("Segmentation has overlapping segments")]
    OverlappingSegmentation,

    /// A regular expression failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A snapshot file has an unexpected layout.
    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for segtable operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

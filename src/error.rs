//! Error kinds shared by every container.
//!
//! `EmptyContainer`, `KeyNotFound` and `ElementNotFound` are ordinary,
//! checkable outcomes. The remaining kinds signal misuse (foreign or stale
//! positions, bad indices, bad configuration), exhaustion, or a persisted
//! stream that failed validation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollectionError>;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("operation requires a non-empty container")]
    EmptyContainer,

    #[error("key not found")]
    KeyNotFound,

    #[error("element not found")]
    ElementNotFound,

    /// The position belongs to another container, or was already removed.
    #[error("position is not owned by this container")]
    NotOwned,

    #[error("index {index} out of range for bound {bound}")]
    IndexOutOfRange { index: usize, bound: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Backing storage would have to grow past its fixed maximum.
    #[error("capacity exhausted at {capacity} buckets")]
    ResourceExhausted { capacity: usize },

    #[error("corrupt persisted data: {0}")]
    CorruptData(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectionError {
    /// True for the kinds callers are expected to branch on during normal use.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            CollectionError::EmptyContainer
                | CollectionError::KeyNotFound
                | CollectionError::ElementNotFound
        )
    }
}

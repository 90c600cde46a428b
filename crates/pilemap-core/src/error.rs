//! Error types surfaced by the editor.
//!
//! None of these are fatal: every error is reported to the user as a
//! message and leaves the scene in its last consistent state.

use crate::pile::PileId;
use thiserror::Error;

/// Errors produced by editor operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// A create or duplicate was attempted against a full category.
    #[error("[{category}] already has {drawn} of {capacity} piles drawn (limit reached)")]
    CapacityExceeded {
        category: String,
        drawn: u32,
        capacity: u32,
    },

    /// A pile has no label, or shares its label with another pile.
    #[error("Pile label is empty or used more than once")]
    DuplicateOrEmptyName { pile: PileId, label: String },

    /// A category still has piles left to draw.
    #[error("[{category}] still has {remaining} piles left to draw")]
    IncompleteCategory { category: String, remaining: u32 },

    /// The scene could not be loaded.
    #[error("[E0] Failed to load data: {0}")]
    LoadFailed(String),

    /// The background image could not be found.
    #[error("[E1] Background image not found: {0}")]
    AssetMissing(String),
}

impl EditorError {
    /// Short, stable name of the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            EditorError::DuplicateOrEmptyName { .. } => ErrorKind::DuplicateOrEmptyName,
            EditorError::IncompleteCategory { .. } => ErrorKind::IncompleteCategory,
            EditorError::LoadFailed(_) => ErrorKind::LoadFailed,
            EditorError::AssetMissing(_) => ErrorKind::AssetMissing,
        }
    }
}

/// Discriminant of [`EditorError`] for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CapacityExceeded,
    DuplicateOrEmptyName,
    IncompleteCategory,
    LoadFailed,
    AssetMissing,
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

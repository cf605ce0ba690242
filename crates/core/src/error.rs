//! Error types for the Canary domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error type.

use thiserror::Error;

// --- Formatting errors ---

/// A single value could not be turned into text.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    #[error("no text representation for {type_name}")]
    NoTextForm { type_name: String },
}

// --- Query translation errors ---

#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    #[error("Query has no entity name")]
    MissingEntity,

    #[error("Query translation failed: {0}")]
    Failed(String),
}

// --- Sink errors ---

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink is closed")]
    Closed,
}

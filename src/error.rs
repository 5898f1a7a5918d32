//! Error types for the collaborator seams.
//!
//! Only the seams get typed errors. Everything above them degrades to a
//! visible state (see `LookupOutcome`, `LoadState`) instead of bubbling up.

use crate::store::BookId;
use thiserror::Error;

/// Failures reported by the rendering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("document could not be opened: {0}")]
    Open(String),
    #[error("display failed: {0}")]
    Display(String),
    #[error("locations index unavailable: {0}")]
    Locations(String),
    #[error("rendition has been destroyed")]
    Destroyed,
}

/// Failures reported by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book {0} not found")]
    BookNotFound(BookId),
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store record could not be decoded: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("store record could not be encoded: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// A single dictionary provider failed; the cascade moves on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

//! Error types for the collaborator layers (settings, generation, browser glue).
//!
//! The animation core itself never fails: placement degrades to fewer shapes
//! and out-of-order `start`/`stop` calls are no-ops.

use thiserror::Error;

/// Errors reported by settings storage, the generation workflow and the
/// browser bindings.
#[derive(Debug, Error)]
pub enum Error {
    /// A colour string could not be parsed.
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    /// The generation service could not be reached or answered with an error.
    #[error("Request failed: {0}")]
    Request(String),

    /// A service response was not valid JSON for the expected shape.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The service reported that generation failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Polling gave up before the image was ready.
    #[error("Image not ready after {0} attempts")]
    AttemptsExhausted(u32),

    /// The settings store rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A browser API was unavailable or threw.
    #[error("Browser API error: {0}")]
    Browser(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

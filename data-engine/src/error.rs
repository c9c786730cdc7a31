//! FILENAME: data-engine/src/error.rs

use table_model::CubeError;
use thiserror::Error;

/// Faults reported by a [`crate::DataSource`] implementation, or detected
/// while decoding its payload.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed dataset: {0}")]
    MalformedPayload(String),
}

/// Errors surfaced by the accumulation engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The fetch collaborator failed or returned an unusable payload. The
    /// accumulated session is left untouched, so retrying with the same
    /// selection is valid.
    #[error("data fetch failed: {0}")]
    FetchFailed(#[from] SourceError),

    /// A cube path segment collided with a reserved structural key.
    #[error(transparent)]
    Cube(#[from] CubeError),
}

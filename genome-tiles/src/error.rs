//! Error types shared across the tile engine.
//!
//! Two families live here:
//!
//! - [`FetchError`]: a failure loading one tile (or a dataset's metadata).
//!   It is stored on the tile itself, so it is `Clone` and never propagates
//!   beyond that tile.
//! - [`ViewportError`]: an invalid viewport handed in by the caller. These are
//!   rejected synchronously when the viewport value is constructed and never
//!   reach the cache layer.

use thiserror::Error;

/// Failure while fetching a tile payload or dataset metadata.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Non-success HTTP status from the path-addressed file protocol.
    #[error("HTTP request error: {status_text} ({status})")]
    Http { status: u16, status_text: String },

    /// The request never produced a response (DNS, connection, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded into the expected payload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The data source rejected or failed the request.
    #[error("Data source error: {0}")]
    Source(String),

    /// Dataset-wide metadata could not be loaded.
    #[error("Metadata error: {0}")]
    Metadata(String),
}

impl FetchError {
    /// Returns the HTTP status code if this failure came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Invalid viewport parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    /// The visible range is empty or inverted.
    #[error("Invalid range: x1 ({x1}) must be greater than x0 ({x0})")]
    EmptyRange { x0: f64, x1: f64 },

    /// A range bound is NaN or infinite.
    #[error("Range bounds must be finite (x0: {x0}, x1: {x1})")]
    NonFinite { x0: f64, x1: f64 },

    /// The pixel width is zero, negative or not finite.
    #[error("Invalid pixel width: {0}")]
    InvalidWidth(f64),
}

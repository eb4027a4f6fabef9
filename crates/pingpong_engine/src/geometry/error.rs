//! Geometry errors

use thiserror::Error;

/// Errors raised while building or compiling geometry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Malformed geometry: wrong vertex count for the mode, degenerate face,
    /// inconsistent vertex formats, bad format tags
    #[error("Validation error: {0}")]
    Validation(String),

    /// Data was requested that the vertices do not carry
    #[error("Missing data: {0}")]
    MissingData(String),
}

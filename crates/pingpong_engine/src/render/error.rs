//! Rendering errors

use thiserror::Error;

use crate::foundation::collections::ShapeKey;
use crate::geometry::GeometryError;

/// Comprehensive error types for rendering operations
///
/// Render errors raised while drawing a frame are logged by the frame loop
/// and the rest of that frame is skipped. The same errors raised during
/// setup (creating render groups, adding models) are returned to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A rendering operation failed during execution
    ///
    /// Draw calls, presentation and anything else that happens while a frame
    /// is in progress.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Buffers, programs and textures that the backend could not create.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// An operation on a GPU object in the wrong state
    ///
    /// Adding a buffer to a vertex array that is not bound, drawing with no
    /// program in use, using a handle after it was released.
    #[error("Resource state error: {0}")]
    ResourceState(String),

    /// Shader source could not be loaded, parsed or compiled
    #[error("Shader error: {0}")]
    Shader(String),

    /// Compiled vertex data does not fit the layout the vertex shader declares
    #[error("Vertex layout mismatch: shader expects {expected} floats per vertex, data has {found}")]
    LayoutMismatch { expected: usize, found: usize },

    /// A model refers to a shape that is no longer in the scene
    #[error("Render group model {0:?} is not in the scene")]
    MissingShape(ShapeKey),

    /// Vertex data could not be compiled
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

//! Animation errors

use thiserror::Error;

use crate::foundation::collections::ShapeKey;

/// Errors raised while stepping animators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// An animator targets a shape that is no longer in the scene
    #[error("Animator target {0:?} is not in the scene")]
    MissingTarget(ShapeKey),
}

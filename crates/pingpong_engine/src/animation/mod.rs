//! Animation
//!
//! Shapes move by way of [`PhysicsAnimator`]s: force stacks that are
//! integrated once per frame and applied to their target shapes.

pub mod error;
pub mod physics_animator;

pub use error::AnimationError;
pub use physics_animator::PhysicsAnimator;

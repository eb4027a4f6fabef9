//! Backend implementations for the render module
//!
//! Only the headless recording backend ships with the engine; windowed
//! backends implement [`GraphicsBackend`](crate::render::GraphicsBackend)
//! outside the crate.

/// Recording backend that draws nothing
pub mod headless;

pub use headless::{BackendCall, HeadlessBackend};

//! Placement of things in the world
//!
//! A [`Transform`] places a shape (model matrix `T * R * S`); a [`Camera`]
//! places the viewer and produces the inverse placement as its view matrix.
//! Both derive their matrix lazily through a [`CachedMatrix`].

pub mod cache;
pub mod camera;
pub mod model;

pub use cache::{CacheState, CachedMatrix};
pub use camera::Camera;
pub use model::Transform;

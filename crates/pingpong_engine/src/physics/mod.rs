//! Physics module for collision detection
//!
//! Bounding volumes attached to shapes, exhaustive pairwise detection and
//! per-volume collision handlers.

pub mod collision;
pub mod collision_system;

pub use collision::{
    box_box_collision, box_sphere_collision, point_box_collision, point_sphere_collision,
    sphere_sphere_collision, Attachment, BoundingVolume, CollisionError, ResolvedVolume,
    VolumeKind, VolumeShape,
};
pub use collision_system::{CollisionEvent, CollisionHandler, CollisionPair, CollisionSystem};

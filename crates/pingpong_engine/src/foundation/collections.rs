//! Arena handles
//!
//! Shapes, animators and bounding volumes live in slot maps. Everything that
//! refers to another object stores one of these keys and resolves it at query
//! time, so removing a shape never leaves a dangling reference behind: the
//! stale key simply stops resolving.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a [`Shape`](crate::geometry::Shape) stored in a [`Scene`](crate::scene::Scene)
    pub struct ShapeKey;

    /// Handle to a [`PhysicsAnimator`](crate::animation::PhysicsAnimator) stored in a scene
    pub struct AnimatorKey;

    /// Handle to a bounding volume registered with a
    /// [`CollisionSystem`](crate::physics::CollisionSystem)
    pub struct VolumeKey;
}

/// Shape storage shared by the scene, the collision system and the animators
pub type ShapeArena = SlotMap<ShapeKey, crate::geometry::Shape>;

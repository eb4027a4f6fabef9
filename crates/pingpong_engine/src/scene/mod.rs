//! Scene: the world the frame loop operates on
//!
//! The scene owns every shape, every animator and the cameras. Collision
//! volumes, render groups and animators refer to shapes by [`ShapeKey`] and
//! look them up here when they need them.

use crate::animation::{AnimationError, PhysicsAnimator};
use crate::foundation::collections::{AnimatorKey, ShapeArena, ShapeKey, SlotMap};
use crate::geometry::Shape;
use crate::transform::Camera;

/// Shapes, animators and cameras
pub struct Scene {
    shapes: ShapeArena,
    animators: SlotMap<AnimatorKey, PhysicsAnimator>,
    /// Step order; slot order changes once removed slots are reused
    animator_order: Vec<AnimatorKey>,
    cameras: Vec<Camera>,
    active_camera: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with one camera at the origin
    pub fn new() -> Self {
        Self {
            shapes: ShapeArena::with_key(),
            animators: SlotMap::with_key(),
            animator_order: Vec::new(),
            cameras: vec![Camera::new()],
            active_camera: 0,
        }
    }

    /// Add a shape and return its key
    pub fn add_shape(&mut self, shape: Shape) -> ShapeKey {
        self.shapes.insert(shape)
    }

    /// Remove a shape; volumes and animators still pointing at it will
    /// report it missing
    pub fn remove_shape(&mut self, key: ShapeKey) -> Option<Shape> {
        self.shapes.remove(key)
    }

    /// Look up a shape
    pub fn shape(&self, key: ShapeKey) -> Option<&Shape> {
        self.shapes.get(key)
    }

    /// Look up a shape, mutably
    pub fn shape_mut(&mut self, key: ShapeKey) -> Option<&mut Shape> {
        self.shapes.get_mut(key)
    }

    /// Every shape
    pub fn shapes(&self) -> &ShapeArena {
        &self.shapes
    }

    /// Every shape, mutably
    pub fn shapes_mut(&mut self) -> &mut ShapeArena {
        &mut self.shapes
    }

    /// Add an animator and return its key
    pub fn add_animator(&mut self, animator: PhysicsAnimator) -> AnimatorKey {
        let key = self.animators.insert(animator);
        self.animator_order.push(key);
        key
    }

    /// Remove an animator; the others keep their step order
    pub fn remove_animator(&mut self, key: AnimatorKey) -> Option<PhysicsAnimator> {
        let removed = self.animators.remove(key)?;
        self.animator_order.retain(|k| *k != key);
        Some(removed)
    }

    /// Look up an animator
    pub fn animator(&self, key: AnimatorKey) -> Option<&PhysicsAnimator> {
        self.animators.get(key)
    }

    /// Look up an animator, mutably
    pub fn animator_mut(&mut self, key: AnimatorKey) -> Option<&mut PhysicsAnimator> {
        self.animators.get_mut(key)
    }

    /// Number of animators
    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    /// Step every animator once, in insertion order
    pub fn step_animators(&mut self) -> Result<(), AnimationError> {
        for key in &self.animator_order {
            if let Some(animator) = self.animators.get_mut(*key) {
                animator.step(&mut self.shapes)?;
            }
        }
        Ok(())
    }

    /// Add a camera and return its index
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    /// Switch the camera used for rendering; false if `index` is out of range
    pub fn set_active_camera(&mut self, index: usize) -> bool {
        if index < self.cameras.len() {
            self.active_camera = index;
            true
        } else {
            log::warn!(
                "Camera {index} does not exist ({} cameras)",
                self.cameras.len()
            );
            false
        }
    }

    /// Index of the camera used for rendering
    pub fn active_camera_index(&self) -> usize {
        self.active_camera
    }

    /// The camera used for rendering
    pub fn camera(&self) -> &Camera {
        &self.cameras[self.active_camera]
    }

    /// The camera used for rendering, mutably
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.cameras[self.active_camera]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_step_animators() {
        let mut scene = Scene::new();
        let ball = scene.add_shape(Shape::cube(1.0, Vec3::zeros(), None));
        scene.add_animator(PhysicsAnimator::gravity(0.5).targeting(ball));
        scene.add_animator(PhysicsAnimator::new().with_momentum(Vec3::x()).targeting(ball));

        scene.step_animators().unwrap();
        assert_relative_eq!(scene.shape(ball).unwrap().translation(), Vec3::new(1.0, -0.5, 0.0));
    }

    #[test]
    fn test_removed_shape_breaks_animator() {
        let mut scene = Scene::new();
        let ball = scene.add_shape(Shape::cube(1.0, Vec3::zeros(), None));
        scene.add_animator(PhysicsAnimator::gravity(0.5).targeting(ball));
        scene.remove_shape(ball);
        assert_eq!(scene.step_animators(), Err(AnimationError::MissingTarget(ball)));
    }

    #[test]
    fn test_animators_step_in_insertion_order() {
        let mut scene = Scene::new();
        let paddle = scene.add_shape(Shape::cube(1.0, Vec3::zeros(), None));
        let ghost = scene.add_shape(Shape::cube(1.0, Vec3::zeros(), None));
        scene.remove_shape(ghost);

        let first = scene.add_animator(PhysicsAnimator::new());
        scene.add_animator(PhysicsAnimator::new().with_momentum(Vec3::x()).targeting(paddle));
        scene.remove_animator(first);
        // Reuses the freed slot, but was added last so it steps last.
        scene.add_animator(PhysicsAnimator::new().targeting(ghost));

        assert_eq!(scene.step_animators(), Err(AnimationError::MissingTarget(ghost)));
        assert_relative_eq!(scene.shape(paddle).unwrap().translation(), Vec3::x());
        assert_eq!(scene.animator_count(), 2);
    }

    #[test]
    fn test_camera_switching() {
        let mut scene = Scene::new();
        let second = scene.add_camera(Camera::at(Vec3::new(0.0, 5.0, 0.0)));
        assert!(scene.set_active_camera(second));
        assert_relative_eq!(scene.camera().position(), Vec3::new(0.0, 5.0, 0.0));
        assert!(!scene.set_active_camera(7));
        assert_eq!(scene.active_camera_index(), second);
    }
}

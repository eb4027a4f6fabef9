//! Force-stack animator
//!
//! An animator keeps two stacks of vectors, one for translation and one for
//! rotation (yaw, pitch, roll). Each step integrates a stack from the front:
//!
//! ```text
//! for i in 0..len - 1 { stack[i + 1] += stack[i] }
//! ```
//!
//! and the last entry is applied to every target. Index 0 is the newest
//! impulse and the last index is the velocity that actually moves the shape,
//! so a stack `[force, velocity]` behaves like a constant acceleration.

use crate::animation::AnimationError;
use crate::foundation::collections::{ShapeArena, ShapeKey};
use crate::foundation::math::{EulerAngles, Vec3};

/// Moves and spins its target shapes each frame
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsAnimator {
    targets: Vec<ShapeKey>,
    translate_stack: Vec<Vec3>,
    rotate_stack: Vec<Vec3>,
}

impl Default for PhysicsAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsAnimator {
    /// Animator with a single zero velocity in each stack
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            translate_stack: vec![Vec3::zeros()],
            rotate_stack: vec![Vec3::zeros()],
        }
    }

    /// Constant downward acceleration of `force` per step
    pub fn gravity(force: f32) -> Self {
        Self {
            targets: Vec::new(),
            translate_stack: vec![Vec3::new(0.0, -force, 0.0), Vec3::zeros()],
            rotate_stack: vec![Vec3::zeros()],
        }
    }

    /// Builder pattern: set the starting velocity
    pub fn with_momentum(mut self, velocity: Vec3) -> Self {
        self.set_momentum(velocity);
        self
    }

    /// Builder pattern: set the starting angular velocity
    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.set_spin(spin);
        self
    }

    /// Builder pattern: add a target
    pub fn targeting(mut self, shape: ShapeKey) -> Self {
        self.apply_to(shape);
        self
    }

    /// Start animating a shape; adding the same shape twice has no effect
    pub fn apply_to(&mut self, shape: ShapeKey) {
        if !self.targets.contains(&shape) {
            self.targets.push(shape);
        }
    }

    /// Stop animating a shape
    pub fn remove_target(&mut self, shape: ShapeKey) -> bool {
        let before = self.targets.len();
        self.targets.retain(|target| *target != shape);
        self.targets.len() != before
    }

    /// Shapes moved by every step
    pub fn targets(&self) -> &[ShapeKey] {
        &self.targets
    }

    /// Current velocity (last translate entry)
    pub fn momentum(&self) -> Vec3 {
        self.translate_stack.last().copied().unwrap_or_else(Vec3::zeros)
    }

    /// Overwrite the current velocity
    pub fn set_momentum(&mut self, velocity: Vec3) {
        set_last(&mut self.translate_stack, velocity);
    }

    /// Current angular velocity (last rotate entry) as `(yaw, pitch, roll)`
    pub fn spin(&self) -> Vec3 {
        self.rotate_stack.last().copied().unwrap_or_else(Vec3::zeros)
    }

    /// Overwrite the current angular velocity
    pub fn set_spin(&mut self, spin: Vec3) {
        set_last(&mut self.rotate_stack, spin);
    }

    /// Put a new impulse at the front of the translate stack
    pub fn push_force(&mut self, force: Vec3) {
        self.translate_stack.insert(0, force);
    }

    /// Put a new impulse at the front of the rotate stack
    pub fn push_torque(&mut self, torque: Vec3) {
        self.rotate_stack.insert(0, torque);
    }

    /// Pending translation increments, oldest impulse first
    pub fn translate_stack(&self) -> &[Vec3] {
        &self.translate_stack
    }

    /// Pending rotation increments
    pub fn rotate_stack(&self) -> &[Vec3] {
        &self.rotate_stack
    }

    /// Integrate both stacks, then move and rotate every target
    ///
    /// All targets are checked before anything moves, so a missing target
    /// leaves the stacks and the other shapes untouched.
    pub fn step(&mut self, shapes: &mut ShapeArena) -> Result<(), AnimationError> {
        if let Some(missing) = self.targets.iter().find(|key| !shapes.contains_key(**key)) {
            return Err(AnimationError::MissingTarget(*missing));
        }

        accumulate(&mut self.translate_stack);
        accumulate(&mut self.rotate_stack);

        let velocity = self.momentum();
        let spin = EulerAngles::from_vec3(self.spin());
        for key in &self.targets {
            if let Some(shape) = shapes.get_mut(*key) {
                shape.translate_by(velocity);
                shape.rotate_by(spin);
            }
        }
        Ok(())
    }
}

/// Prefix sum from the front: each entry absorbs everything before it
fn accumulate(stack: &mut [Vec3]) {
    for i in 1..stack.len() {
        let previous = stack[i - 1];
        stack[i] += previous;
    }
}

fn set_last(stack: &mut Vec<Vec3>, value: Vec3) {
    match stack.last_mut() {
        Some(last) => *last = value,
        None => stack.push(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use approx::assert_relative_eq;

    fn arena_with_cube() -> (ShapeArena, ShapeKey) {
        let mut shapes = ShapeArena::with_key();
        let key = shapes.insert(Shape::cube(1.0, Vec3::zeros(), None));
        (shapes, key)
    }

    #[test]
    fn test_gravity_accelerates() {
        let (mut shapes, ball) = arena_with_cube();
        let mut animator = PhysicsAnimator::gravity(1.0).targeting(ball);

        for _ in 0..3 {
            animator.step(&mut shapes).unwrap();
        }
        // Velocity goes -1, -2, -3, so the shape falls 6 units.
        assert_relative_eq!(shapes[ball].translation(), Vec3::new(0.0, -6.0, 0.0));
        assert_relative_eq!(animator.momentum(), Vec3::new(0.0, -3.0, 0.0));
        // The force itself never changes.
        assert_relative_eq!(animator.translate_stack()[0], Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_constant_velocity_and_spin() {
        let (mut shapes, key) = arena_with_cube();
        let mut animator = PhysicsAnimator::new()
            .with_momentum(Vec3::new(0.5, 0.0, 0.0))
            .with_spin(Vec3::new(0.1, 0.0, 0.0))
            .targeting(key);

        animator.step(&mut shapes).unwrap();
        animator.step(&mut shapes).unwrap();
        assert_relative_eq!(shapes[key].translation(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(shapes[key].transform().rotation().yaw, 0.2);
    }

    #[test]
    fn test_push_force_goes_to_front() {
        let mut animator = PhysicsAnimator::new().with_momentum(Vec3::new(1.0, 0.0, 0.0));
        animator.push_force(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(animator.translate_stack().len(), 2);
        assert_relative_eq!(animator.translate_stack()[0], Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(animator.momentum(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_missing_target_moves_nothing() {
        let (mut shapes, key) = arena_with_cube();
        let gone = shapes.insert(Shape::cube(1.0, Vec3::zeros(), None));
        shapes.remove(gone);

        let mut animator = PhysicsAnimator::gravity(1.0).targeting(key).targeting(gone);
        assert_eq!(animator.step(&mut shapes), Err(AnimationError::MissingTarget(gone)));
        assert_relative_eq!(shapes[key].translation(), Vec3::zeros());
        assert_relative_eq!(animator.momentum(), Vec3::zeros());
    }

    #[test]
    fn test_targets_are_unique() {
        let (_shapes, key) = arena_with_cube();
        let mut animator = PhysicsAnimator::new();
        animator.apply_to(key);
        animator.apply_to(key);
        assert_eq!(animator.targets().len(), 1);
        assert!(animator.remove_target(key));
        assert!(!animator.remove_target(key));
    }
}

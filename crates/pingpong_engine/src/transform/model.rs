//! Model transforms

use crate::foundation::math::{EulerAngles, Mat4, Vec3};
use crate::transform::{CacheState, CachedMatrix};

/// Translation, rotation and scale of a shape
///
/// The model matrix is `T * R * S`: scale first, then rotate (see
/// [`EulerAngles::to_matrix`]), then translate. It is recomputed on the next
/// [`matrix`](Self::matrix) call after any setter runs, and never otherwise.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: EulerAngles,
    scale: Vec3,
    cache: CachedMatrix,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform
    pub fn new() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: EulerAngles::default(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            cache: CachedMatrix::new(),
        }
    }

    /// Builder pattern: set the translation
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.set_translation(translation);
        self
    }

    /// World-space translation
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Rotation angles
    pub fn rotation(&self) -> EulerAngles {
        self.rotation
    }

    /// Per-axis scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Replace the translation
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.cache.invalidate();
    }

    /// Replace the rotation
    pub fn set_rotation(&mut self, rotation: EulerAngles) {
        self.rotation = rotation;
        self.cache.invalidate();
    }

    /// Replace the scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.cache.invalidate();
    }

    /// Add to the translation
    pub fn translate_by(&mut self, delta: Vec3) {
        self.set_translation(self.translation + delta);
    }

    /// Add to the rotation angles
    pub fn rotate_by(&mut self, delta: EulerAngles) {
        self.set_rotation(self.rotation.offset_by(delta));
    }

    /// The model matrix, recomputed only if something changed
    pub fn matrix(&mut self) -> Mat4 {
        let (translation, rotation, scale) = (self.translation, self.rotation, self.scale);
        self.cache.get_or_compute(|| {
            log::trace!("Recomputing model matrix for translation {translation:?}");
            Mat4::new_translation(&translation) * rotation.to_matrix() * Mat4::new_nonuniform_scaling(&scale)
        })
    }

    /// Whether the next [`matrix`](Self::matrix) call recomputes
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// How many times the model matrix has been computed
    pub fn recompute_count(&self) -> u64 {
        self.cache.recompute_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let mut transform = Transform::new();
        assert_eq!(transform.matrix(), Mat4::identity());
    }

    #[test]
    fn test_matrix_is_cached_until_changed() {
        let mut transform = Transform::new();
        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        let first = transform.matrix();
        let second = transform.matrix();
        assert_eq!(first, second);
        assert_eq!(transform.recompute_count(), 1);
        assert_eq!(transform.cache_state(), CacheState::Clean);

        transform.translate_by(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(transform.cache_state(), CacheState::Dirty);
        transform.matrix();
        assert_eq!(transform.recompute_count(), 2);
    }

    #[test]
    fn test_several_changes_recompute_once() {
        let mut transform = Transform::new();
        transform.matrix();
        let before = transform.recompute_count();

        transform.set_translation(Vec3::new(1.0, 0.0, 0.0));
        transform.set_rotation(EulerAngles::new(0.3, 0.2, 0.1));
        transform.set_scale(Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(transform.cache_state(), CacheState::Dirty);

        let first = transform.matrix();
        let second = transform.matrix();
        assert_eq!(first, second);
        assert_eq!(transform.recompute_count(), before + 1);
    }

    #[test]
    fn test_scale_then_rotate_then_translate() {
        let mut transform = Transform::new();
        transform.set_scale(Vec3::new(2.0, 2.0, 2.0));
        transform.set_rotation(EulerAngles::new(constants::HALF_PI, 0.0, 0.0));
        transform.set_translation(Vec3::new(10.0, 0.0, 0.0));

        // (1,0,0) scaled to (2,0,0), yawed to (0,0,-2), then moved by +10 in x.
        let moved = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(moved, Vec4::new(10.0, 0.0, -2.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_by_accumulates() {
        let mut transform = Transform::new();
        transform.rotate_by(EulerAngles::new(0.1, 0.2, 0.0));
        transform.rotate_by(EulerAngles::new(0.1, 0.0, 0.3));
        let rotation = transform.rotation();
        assert_relative_eq!(rotation.yaw, 0.2);
        assert_relative_eq!(rotation.pitch, 0.2);
        assert_relative_eq!(rotation.roll, 0.3);
    }
}

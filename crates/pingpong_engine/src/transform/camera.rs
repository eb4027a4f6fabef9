//! Camera
//!
//! The camera is placed like any object, by a position, yaw/pitch/roll and a
//! zoom factor. Its view matrix is the inverse of that placement:
//!
//! ```text
//! view = S(zoom, zoom, 1) * R^T * T(-position)
//! ```
//!
//! Zoom scales the two screen axes only, so a zoom of 2 doubles the apparent
//! size of everything in view without moving it through the depth range.

use crate::foundation::math::{EulerAngles, Mat4, Vec3};
use crate::geometry::GeometryError;
use crate::transform::CachedMatrix;

/// Direction lengths below this cannot define an orientation
const DIRECTION_EPSILON: f32 = 1e-6;

/// Viewer position, orientation and zoom
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    rotation: EulerAngles,
    zoom: f32,
    view: CachedMatrix,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Camera at the origin looking down -Z
    pub fn new() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: EulerAngles::default(),
            zoom: 1.0,
            view: CachedMatrix::new(),
        }
    }

    /// Camera at `position` looking down -Z
    pub fn at(position: Vec3) -> Self {
        let mut camera = Self::new();
        camera.set_position(position);
        camera
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Yaw, pitch and roll
    pub fn rotation(&self) -> EulerAngles {
        self.rotation
    }

    /// Zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Move to an absolute position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view.invalidate();
    }

    /// Move by a world-space offset
    pub fn move_by(&mut self, delta: Vec3) {
        self.set_position(self.position + delta);
    }

    /// Set absolute angles
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.rotation = EulerAngles::new(yaw, pitch, roll);
        self.view.invalidate();
    }

    /// Add to the current angles
    pub fn rotate_by(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.rotation = self.rotation.offset_by(EulerAngles::new(yaw, pitch, roll));
        self.view.invalidate();
    }

    /// Set the zoom factor; it must be positive
    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), GeometryError> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(GeometryError::Validation(format!(
                "camera zoom must be positive, got {zoom}"
            )));
        }
        self.zoom = zoom;
        self.view.invalidate();
        Ok(())
    }

    /// Multiply the zoom factor
    pub fn relative_zoom(&mut self, factor: f32) -> Result<(), GeometryError> {
        self.set_zoom(self.zoom * factor)
    }

    /// Move along the camera's own axes
    ///
    /// Positive `right` strafes right, positive `up` rises along the camera's
    /// up vector and positive `forward` moves in the viewing direction.
    pub fn relative_move(&mut self, right: f32, up: f32, forward: f32) {
        let local = Vec3::new(right, up, -forward);
        let world = self.rotation.to_matrix().transform_vector(&local);
        self.move_by(world);
    }

    /// Point the camera at a world position, leaving roll at zero
    pub fn look_at(&mut self, target: Vec3) -> Result<(), GeometryError> {
        let direction = target - self.position;
        if direction.norm() < DIRECTION_EPSILON {
            return Err(GeometryError::Validation(
                "cannot look at the camera's own position".to_string(),
            ));
        }
        let direction = direction.normalize();
        let pitch = direction.y.clamp(-1.0, 1.0).asin();
        let yaw = (-direction.x).atan2(-direction.z);
        self.set_rotation(yaw, pitch, 0.0);
        Ok(())
    }

    /// Unit viewing direction in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation.to_matrix().transform_vector(&Vec3::new(0.0, 0.0, -1.0))
    }

    /// Unit right vector in world space
    pub fn right(&self) -> Vec3 {
        self.rotation.to_matrix().transform_vector(&Vec3::x())
    }

    /// Unit up vector in world space
    pub fn up(&self) -> Vec3 {
        self.rotation.to_matrix().transform_vector(&Vec3::y())
    }

    /// The view matrix, recomputed only after the camera changed
    pub fn view_matrix(&mut self) -> Mat4 {
        let (position, rotation, zoom) = (self.position, self.rotation, self.zoom);
        self.view.get_or_compute(|| {
            log::trace!("Recomputing view matrix at {position:?}");
            Mat4::new_nonuniform_scaling(&Vec3::new(zoom, zoom, 1.0))
                * rotation.to_matrix().transpose()
                * Mat4::new_translation(&-position)
        })
    }

    /// How many times the view matrix has been computed
    pub fn view_recompute_count(&self) -> u64 {
        self.view.recompute_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Vec4};
    use approx::assert_relative_eq;

    fn project(camera: &mut Camera, point: Vec3) -> Vec3 {
        let v = camera.view_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec3::new(v.x, v.y, v.z)
    }

    #[test]
    fn test_view_is_inverse_translation() {
        let mut camera = Camera::at(Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(project(&mut camera, Vec3::zeros()), Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn test_zoom_scales_screen_axes() {
        let mut camera = Camera::new();
        camera.set_zoom(2.0).unwrap();
        assert_relative_eq!(
            project(&mut camera, Vec3::new(1.0, 1.0, -1.0)),
            Vec3::new(2.0, 2.0, -1.0)
        );
        camera.relative_zoom(0.5).unwrap();
        assert_relative_eq!(camera.zoom(), 1.0);
        assert!(camera.set_zoom(0.0).is_err());
        assert!(camera.set_zoom(-1.0).is_err());
    }

    #[test]
    fn test_relative_move_follows_yaw() {
        let mut camera = Camera::new();
        camera.set_rotation(constants::HALF_PI, 0.0, 0.0);

        // Facing -X, strafing right heads towards -Z.
        camera.relative_move(1.0, 0.0, 0.0);
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);

        camera.relative_move(0.0, 0.0, 2.0);
        assert_relative_eq!(camera.position(), Vec3::new(-2.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_centers_target() {
        let mut camera = Camera::at(Vec3::new(3.0, 2.0, 5.0));
        camera.look_at(Vec3::zeros()).unwrap();

        let distance = Vec3::new(3.0, 2.0, 5.0).norm();
        assert_relative_eq!(
            project(&mut camera, Vec3::zeros()),
            Vec3::new(0.0, 0.0, -distance),
            epsilon = 1e-5
        );
        assert_relative_eq!(camera.rotation().roll, 0.0);
    }

    #[test]
    fn test_look_at_own_position_fails() {
        let mut camera = Camera::at(Vec3::new(1.0, 1.0, 1.0));
        assert!(camera.look_at(Vec3::new(1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_view_cached_between_reads() {
        let mut camera = Camera::new();
        camera.view_matrix();
        camera.view_matrix();
        assert_eq!(camera.view_recompute_count(), 1);
        camera.rotate_by(0.1, 0.0, 0.0);
        camera.view_matrix();
        assert_eq!(camera.view_recompute_count(), 2);
    }

    #[test]
    fn test_move_and_zoom_recompute_once() {
        let mut camera = Camera::new();
        camera.view_matrix();
        let before = camera.view_recompute_count();

        camera.set_position(Vec3::new(0.0, 1.0, 4.0));
        camera.set_zoom(1.5).unwrap();
        camera.view_matrix();
        camera.view_matrix();
        assert_eq!(camera.view_recompute_count(), before + 1);
    }

    #[test]
    fn test_basis_vectors() {
        let camera = Camera::new();
        assert_relative_eq!(camera.forward(), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(camera.right(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(camera.up(), Vec3::new(0.0, 1.0, 0.0));
    }
}

//! Math utilities and types
//!
//! Provides the math aliases used by the engine plus the rotation and
//! projection helpers shared by shapes and cameras.
//!
//! # Coordinate System
//! Right-handed, Y-up, with -Z as the forward direction. Angles are radians
//! and positive angles rotate counter-clockwise when looking down the axis
//! towards the origin.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Yaw, pitch and roll in radians
///
/// Yaw turns around the up axis (+Y), pitch around the right axis (+X) and
/// roll around the forward axis (Z). See [`Mat4Ext::yaw_pitch_roll`] for the
/// composition order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation around +Y
    pub yaw: f32,
    /// Rotation around +X
    pub pitch: f32,
    /// Rotation around Z
    pub roll: f32,
}

impl EulerAngles {
    /// Create a new set of angles
    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Build from a vector laid out as `(yaw, pitch, roll)`
    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Component-wise sum
    pub fn offset_by(self, delta: Self) -> Self {
        Self::new(self.yaw + delta.yaw, self.pitch + delta.pitch, self.roll + delta.roll)
    }

    /// Rotation matrix for these angles
    pub fn to_matrix(self) -> Mat4 {
        Mat4::yaw_pitch_roll(self.yaw, self.pitch, self.roll)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Compose yaw, pitch and roll as `Ry(yaw) * Rx(pitch) * Rz(roll)`
    ///
    /// Yaw is applied first in the parent frame, then pitch around the yawed
    /// right axis, then roll around the resulting forward axis. The order is
    /// not commutative; cameras and shapes both rely on this exact order.
    fn yaw_pitch_roll(yaw: f32, pitch: f32, roll: f32) -> Mat4;

    /// OpenGL-style perspective projection (clip space z in [-1, 1])
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn yaw_pitch_roll(yaw: f32, pitch: f32, roll: f32) -> Mat4 {
        Mat4::rotation_y(yaw) * Mat4::rotation_x(pitch) * Mat4::rotation_z(roll)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }
}

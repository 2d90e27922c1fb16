//! Math type re-exports and engine-specific math types.
//!
//! This module re-exports types from `glam` and provides the few types the
//! content formats need on top of them (colors, Euler rotations, UV rects).

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Degrees to radians factor.
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Radians to degrees factor.
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

/// RGBA color with float channels.
///
/// Stored as four consecutive `f32` values; that layout is the stream encoding.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Build from 8-bit channels.
    #[inline]
    pub fn from_bytes(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self::new(
            red as f32 / 255.0,
            green as f32 / 255.0,
            blue as f32 / 255.0,
            alpha as f32 / 255.0,
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Color({}, {}, {}, {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

/// Rotation built from Euler angles.
///
/// The engine composes `qx * qy * qz` and builds its matrix as the transpose
/// of the usual quaternion matrix, so the rotation applied to a vector is
/// `Rz(-z) * Ry(-y) * Rx(-x)`. The stored quaternion is the one whose glam
/// action matches that matrix. The source angles are kept so content can be
/// written back unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    euler: Vec3,
    quat: Quat,
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        euler: Vec3::ZERO,
        quat: Quat::IDENTITY,
    };

    /// Create from Euler angles in radians.
    pub fn from_euler_radians(euler: Vec3) -> Self {
        Self {
            euler,
            quat: Quat::from_euler(EulerRot::ZYX, -euler.z, -euler.y, -euler.x),
        }
    }

    /// Create from Euler angles in degrees, as stored in content files.
    pub fn from_euler_degrees(degrees: Vec3) -> Self {
        Self::from_euler_radians(degrees * DEG_TO_RAD)
    }

    #[inline]
    pub fn euler_radians(&self) -> Vec3 {
        self.euler
    }

    #[inline]
    pub fn euler_degrees(&self) -> Vec3 {
        self.euler * RAD_TO_DEG
    }

    #[inline]
    pub fn quaternion(&self) -> Quat {
        self.quat
    }

    #[inline]
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_quat(self.quat)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Compose a transform the way bind poses are authored.
///
/// Starts from the rotation matrix, scales its basis columns, then adds the
/// translation column. This order is part of the content contract.
pub fn compose_trs(translation: Vec3, rotation: &Rotation, scale: Vec3) -> Mat4 {
    let r = rotation.matrix();
    let mut m = Mat4::from_cols(
        (r.x_axis * scale.x).extend(0.0),
        (r.y_axis * scale.y).extend(0.0),
        (r.z_axis * scale.z).extend(0.0),
        Vec4::W,
    );
    m.w_axis += translation.extend(0.0);
    m
}

/// Normalized texture rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TextureCoordinates {
    pub u0: f32,
    pub u1: f32,
    pub v0: f32,
    pub v1: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
        assert_eq!(Color::from_bytes(255, 0, 0, 255), Color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_compose_matches_scale_rotation_translation() {
        let rot = Rotation::from_euler_degrees(Vec3::new(30.0, 45.0, 60.0));
        let t = Vec3::new(1.0, 2.0, 3.0);
        let s = Vec3::new(2.0, 0.5, 1.5);

        let m = compose_trs(t, &rot, s);
        let expected = Mat4::from_scale_rotation_translation(s, rot.quaternion(), t);
        assert!(m.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_rotation_keeps_source_angles() {
        let deg = Vec3::new(10.0, -20.0, 90.0);
        let rot = Rotation::from_euler_degrees(deg);
        assert!(rot.euler_degrees().abs_diff_eq(deg, 1e-4));

        // Z-only rotation of 90 degrees maps X onto -Y
        let z = Rotation::from_euler_degrees(Vec3::new(0.0, 0.0, 90.0));
        let v = z.quaternion() * Vec3::X;
        assert!(v.abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    /// Matrix the engine derives from Euler angles: `q = qx * qy * qz`,
    /// rows filled from the transposed quaternion matrix.
    fn engine_matrix(radians: Vec3) -> Mat3 {
        let q = Quat::from_rotation_x(radians.x) * Quat::from_rotation_y(radians.y) * Quat::from_rotation_z(radians.z);
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let row1 = Vec3::new(1.0 - 2.0 * y * y - 2.0 * z * z, 2.0 * x * y + 2.0 * z * w, 2.0 * x * z - 2.0 * y * w);
        let row2 = Vec3::new(2.0 * x * y - 2.0 * z * w, 1.0 - 2.0 * x * x - 2.0 * z * z, 2.0 * y * z + 2.0 * x * w);
        let row3 = Vec3::new(2.0 * x * z + 2.0 * y * w, 2.0 * y * z - 2.0 * x * w, 1.0 - 2.0 * x * x - 2.0 * y * y);
        Mat3::from_cols(row1, row2, row3).transpose()
    }

    #[test]
    fn test_rotation_matches_engine_matrix() {
        for deg in [
            Vec3::new(0.0, 0.0, 90.0),
            Vec3::new(90.0, 0.0, 0.0),
            Vec3::new(30.0, 45.0, 60.0),
            Vec3::new(-120.0, 10.0, 200.0),
        ] {
            let rot = Rotation::from_euler_degrees(deg);
            let expected = engine_matrix(deg * DEG_TO_RAD);
            assert!(rot.matrix().abs_diff_eq(expected, 1e-5), "{:?}", deg);

            let m = compose_trs(Vec3::ZERO, &rot, Vec3::ONE);
            let v = m.transform_point3(Vec3::new(1.0, 2.0, 3.0));
            assert!(v.abs_diff_eq(expected * Vec3::new(1.0, 2.0, 3.0), 1e-5));
        }

        let z = compose_trs(Vec3::ZERO, &Rotation::from_euler_degrees(Vec3::new(0.0, 0.0, 90.0)), Vec3::ONE);
        assert!(z.transform_vector3(Vec3::X).abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }
}

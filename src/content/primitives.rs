//! Procedural primitive shapes.
//!
//! Built-in meshes (`Quad`, `Cube`, `Sphere`) are generated from these at
//! startup rather than loaded from content.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::util::{Vec2, Vec3};

/// Vertex streams and indices of a generated shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub indices: Vec<u16>,
}

impl Primitive {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Flat quad on the XZ plane facing +Y.
    pub fn quad(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(-h, 0.0, h),
                Vec3::new(h, 0.0, h),
                Vec3::new(h, 0.0, -h),
            ],
            normals: vec![Vec3::Y; 4],
            tex_coords: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned cube with four vertices per face.
    pub fn cube(size: f32) -> Self {
        const FACE_NORMALS: [Vec3; 6] = [
            Vec3::NEG_Z,
            Vec3::Z,
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
        ];
        const FACE_UVS: [Vec2; 4] = [
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
        ];

        let h = size * 0.5;
        let mut p = Self::default();
        for (face, normal) in FACE_NORMALS.iter().copied().enumerate() {
            let first = p.positions.len() as u16;
            p.indices
                .extend_from_slice(&[first, first + 1, first + 2, first, first + 2, first + 3]);

            let basis = if face >= 4 { Vec3::Z } else { Vec3::Y };
            let side1 = normal.cross(basis);
            let side2 = normal.cross(side1);
            p.positions.extend_from_slice(&[
                (normal - side1 + side2) * h,
                (normal - side1 - side2) * h,
                (normal + side1 - side2) * h,
                (normal + side1 + side2) * h,
            ]);
            p.normals.extend_from_slice(&[normal; 4]);
            p.tex_coords.extend_from_slice(&FACE_UVS);
        }
        p
    }

    /// UV sphere with `rings` latitude rows and `sectors` longitude columns.
    pub fn sphere(radius: f32, rings: u32, sectors: u32) -> Self {
        let rings = rings.max(2);
        let sectors = sectors.max(2);
        let r_step = 1.0 / (rings - 1) as f32;
        let s_step = 1.0 / (sectors - 1) as f32;

        let mut p = Self::default();
        for r in 0..rings {
            for s in 0..sectors {
                let ring = r as f32 * r_step;
                let sector = s as f32 * s_step;
                let sin_ring = (PI * ring).sin();
                let point = Vec3::new(
                    (TAU * sector).cos() * sin_ring,
                    (-FRAC_PI_2 + PI * ring).sin(),
                    (TAU * sector).sin() * -sin_ring,
                );
                p.tex_coords.push(Vec2::new(sector, ring));
                p.positions.push(point * radius);
                p.normals.push(point);
            }
        }

        for r in 0..rings - 1 {
            for s in 0..sectors - 1 {
                let a = (r * sectors + s) as u16;
                let b = (r * sectors + s + 1) as u16;
                let c = ((r + 1) * sectors + s) as u16;
                let d = ((r + 1) * sectors + s + 1) as u16;
                p.indices.extend_from_slice(&[a, b, c, b, d, c]);
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad() {
        let q = Primitive::quad(2.0);
        assert_eq!(q.vertex_count(), 4);
        assert_eq!(q.index_count(), 6);
        assert_eq!(q.positions[2], Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_cube_faces_sit_on_bounds() {
        let c = Primitive::cube(1.0);
        assert_eq!(c.vertex_count(), 24);
        assert_eq!(c.index_count(), 36);
        for (pos, normal) in c.positions.iter().zip(&c.normals) {
            // Every vertex lies on the face plane of its normal
            assert!((pos.dot(*normal) - 0.5).abs() < 1e-6);
            assert!(pos.abs().max_element() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn test_sphere() {
        let s = Primitive::sphere(2.0, 8, 6);
        assert_eq!(s.vertex_count(), 48);
        assert_eq!(s.index_count(), 7 * 5 * 6);
        assert!(s.indices.iter().all(|&i| (i as usize) < s.vertex_count()));
        for (pos, normal) in s.positions.iter().zip(&s.normals) {
            assert!((pos.length() - 2.0).abs() < 1e-4);
            assert!((normal.length() - 1.0).abs() < 1e-4);
        }
    }
}

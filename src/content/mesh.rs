//! Mesh geometry and the `.mesh.ge` binary format.
//!
//! # Layout
//!
//! ```text
//! "GEMesh  "                      8 bytes
//! vertexCount     u32
//! indexCount      u32
//! vertexStride    u32             bytes per vertex: 24, or 32 with UVs
//! usesTexture     u32             0 / 1
//! isSkinned       u32             0 / 1
//! reserved                        36 bytes
//! vertices        f32 * vertexCount * vertexStride / 4
//! indices         u16 * indexCount
//! [skinned] per vertex: 8 * { boneIndex u32, weight f32 }
//! ```
//!
//! All values little-endian. The stride is trusted; a wrong stride misreads
//! the rest of the file.

use std::io::Write;
use std::sync::LazyLock;

use bytemuck::{Pod, Zeroable};
use byteorder::{LittleEndian, WriteBytesExt};

use super::{Primitive, Resource};
use crate::core::{Named, ObjectName, Reflect, Schema, ValueKind};
use crate::util::{ByteReader, Error, Result};

/// Magic tag at the start of a mesh file.
pub const MESH_TAG: &[u8; 8] = b"GEMesh  ";

/// Reserved bytes after the mesh header.
pub const MESH_HEADER_RESERVED_BYTES: usize = 36;

/// Bone slots stored for every vertex of a skinned mesh.
pub const BONE_ATTACHMENTS_PER_VERTEX: usize = 8;

/// Stride of a vertex holding position and normal.
pub const STRIDE_POSITION_NORMAL: u32 = (3 + 3) * 4;

/// Stride of a vertex holding position, normal and texture coordinates.
pub const STRIDE_POSITION_NORMAL_UV: u32 = (3 + 3 + 2) * 4;

/// One bone influence on a vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct VertexBoneAttachment {
    pub bone_index: u32,
    pub weight: f32,
}

/// Interleaved vertex buffer plus 16-bit indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    pub vertex_count: u32,
    /// Bytes per vertex
    pub vertex_stride: u32,
    pub vertex_data: Vec<f32>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    /// Floats per vertex.
    #[inline]
    pub fn floats_per_vertex(&self) -> usize {
        self.vertex_stride as usize / 4
    }

    /// Interleaved floats of one vertex.
    pub fn vertex(&self, index: usize) -> Option<&[f32]> {
        let n = self.floats_per_vertex();
        self.vertex_data.get(index * n..(index + 1) * n)
    }
}

/// Mesh resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    name: ObjectName,
    group: ObjectName,
    geometry: GeometryData,
    uses_texture: bool,
    /// `vertex_count * BONE_ATTACHMENTS_PER_VERTEX` entries when skinned
    skinning: Vec<VertexBoneAttachment>,
}

impl Mesh {
    pub const SUBDIR: &'static str = "Meshes";
    pub const EXTENSION: &'static str = "mesh.ge";

    /// Empty mesh.
    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            geometry: GeometryData::default(),
            uses_texture: false,
            skinning: Vec::new(),
        }
    }

    /// Interleave position, normal and UV arrays into a textured mesh.
    pub fn from_arrays(
        name: ObjectName,
        positions: &[crate::util::Vec3],
        normals: &[crate::util::Vec3],
        tex_coords: &[crate::util::Vec2],
        indices: &[u16],
    ) -> Result<Self> {
        let count = positions.len();
        if normals.len() != count || tex_coords.len() != count {
            return Err(Error::invalid(format!(
                "vertex stream lengths differ: {} positions, {} normals, {} uvs",
                count,
                normals.len(),
                tex_coords.len()
            )));
        }

        let mut vertex_data = Vec::with_capacity(count * 8);
        for ((p, n), t) in positions.iter().zip(normals).zip(tex_coords) {
            vertex_data.extend_from_slice(&p.to_array());
            vertex_data.extend_from_slice(&n.to_array());
            vertex_data.extend_from_slice(&t.to_array());
        }

        Ok(Self {
            name,
            group: ObjectName::EMPTY,
            geometry: GeometryData {
                vertex_count: count as u32,
                vertex_stride: STRIDE_POSITION_NORMAL_UV,
                vertex_data,
                indices: indices.to_vec(),
            },
            uses_texture: true,
            skinning: Vec::new(),
        })
    }

    pub fn from_primitive(name: ObjectName, primitive: &Primitive) -> Result<Self> {
        Self::from_arrays(
            name,
            &primitive.positions,
            &primitive.normals,
            &primitive.tex_coords,
            &primitive.indices,
        )
    }

    /// Build from raw parts. Skinning, when present, must hold
    /// [`BONE_ATTACHMENTS_PER_VERTEX`] entries per vertex.
    pub fn from_parts(
        name: ObjectName,
        group: ObjectName,
        geometry: GeometryData,
        uses_texture: bool,
        skinning: Vec<VertexBoneAttachment>,
    ) -> Result<Self> {
        let expected_floats = geometry.vertex_count as usize * geometry.floats_per_vertex();
        if geometry.vertex_data.len() != expected_floats {
            return Err(Error::invalid(format!(
                "vertex data holds {} floats, expected {}",
                geometry.vertex_data.len(),
                expected_floats
            )));
        }
        if !skinning.is_empty()
            && skinning.len() != geometry.vertex_count as usize * BONE_ATTACHMENTS_PER_VERTEX
        {
            return Err(Error::invalid(format!(
                "{} bone attachments for {} vertices",
                skinning.len(),
                geometry.vertex_count
            )));
        }
        Ok(Self {
            name,
            group,
            geometry,
            uses_texture,
            skinning,
        })
    }

    /// Decode a `.mesh.ge` file.
    pub fn from_bytes(name: ObjectName, group: ObjectName, data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        Self::read(name, group, &mut r)
    }

    /// Decode a mesh file from the current cursor position.
    pub fn read(name: ObjectName, group: ObjectName, r: &mut ByteReader<'_>) -> Result<Self> {
        r.expect_tag(MESH_TAG)?;
        let vertex_count = r.read_u32()?;
        let index_count = r.read_u32()?;
        let vertex_stride = r.read_u32()?;
        let uses_texture = r.read_u32()? != 0;
        let skinned = r.read_u32()? != 0;
        r.skip(MESH_HEADER_RESERVED_BYTES)?;

        if vertex_stride != STRIDE_POSITION_NORMAL && vertex_stride != STRIDE_POSITION_NORMAL_UV {
            tracing::warn!(mesh = %name, vertex_stride, "unexpected vertex stride");
        }

        let float_count = (vertex_count as u64 * vertex_stride as u64 / 4) as usize;
        let vertex_data = r.read_f32_vec(float_count)?;
        let indices = r.read_u16_vec(index_count as usize)?;

        let mut skinning = Vec::new();
        if skinned {
            let slots = vertex_count as usize * BONE_ATTACHMENTS_PER_VERTEX;
            let bytes = r.read_bytes(slots * std::mem::size_of::<VertexBoneAttachment>())?;
            skinning.reserve_exact(slots);
            for chunk in bytes.chunks_exact(8) {
                let bone_index = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                let weight = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
                skinning.push(VertexBoneAttachment { bone_index, weight });
            }
        }

        tracing::debug!(
            mesh = %name,
            vertex_count,
            index_count,
            vertex_stride,
            skinned,
            "decoded mesh"
        );

        Ok(Self {
            name,
            group,
            geometry: GeometryData {
                vertex_count,
                vertex_stride,
                vertex_data,
                indices,
            },
            uses_texture,
            skinning,
        })
    }

    /// Decode the packed form: a `u32` byte length followed by a mesh file.
    pub fn read_packed(name: ObjectName, group: ObjectName, r: &mut ByteReader<'_>) -> Result<Self> {
        let len = r.read_u32()? as usize;
        let body = r.read_bytes(len)?;
        Self::from_bytes(name, group, body)
    }

    /// Encode as a `.mesh.ge` file.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let g = &self.geometry;
        w.write_all(MESH_TAG)?;
        w.write_u32::<LittleEndian>(g.vertex_count)?;
        w.write_u32::<LittleEndian>(g.indices.len() as u32)?;
        w.write_u32::<LittleEndian>(g.vertex_stride)?;
        w.write_u32::<LittleEndian>(self.uses_texture as u32)?;
        w.write_u32::<LittleEndian>(self.is_skinned() as u32)?;
        w.write_all(&[0u8; MESH_HEADER_RESERVED_BYTES])?;
        for v in &g.vertex_data {
            w.write_f32::<LittleEndian>(*v)?;
        }
        for i in &g.indices {
            w.write_u16::<LittleEndian>(*i)?;
        }
        for a in &self.skinning {
            w.write_u32::<LittleEndian>(a.bone_index)?;
            w.write_f32::<LittleEndian>(a.weight)?;
        }
        Ok(())
    }

    /// Encode the packed form read by [`read_packed`](Self::read_packed).
    pub fn write_packed<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let mut body = Vec::with_capacity(self.encoded_len());
        self.write(&mut body)?;
        w.write_u32::<LittleEndian>(body.len() as u32)?;
        w.write_all(&body)?;
        Ok(())
    }

    /// Size of the `.mesh.ge` encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        MESH_TAG.len()
            + 5 * 4
            + MESH_HEADER_RESERVED_BYTES
            + self.geometry.vertex_data.len() * 4
            + self.geometry.indices.len() * 2
            + self.skinning.len() * std::mem::size_of::<VertexBoneAttachment>()
    }

    #[inline]
    pub fn geometry(&self) -> &GeometryData {
        &self.geometry
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.geometry.vertex_count
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.geometry.indices.len() as u32 / 3
    }

    #[inline]
    pub fn uses_texture(&self) -> bool {
        self.uses_texture
    }

    #[inline]
    pub fn is_skinned(&self) -> bool {
        !self.skinning.is_empty()
    }

    /// Attachment by flat index (`vertex * BONE_ATTACHMENTS_PER_VERTEX + slot`).
    pub fn bone_attachment(&self, index: usize) -> Option<&VertexBoneAttachment> {
        self.skinning.get(index)
    }

    /// All bone slots of one vertex.
    pub fn vertex_bone_attachments(&self, vertex: usize) -> Option<&[VertexBoneAttachment]> {
        let start = vertex * BONE_ATTACHMENTS_PER_VERTEX;
        self.skinning.get(start..start + BONE_ATTACHMENTS_PER_VERTEX)
    }
}

impl Named for Mesh {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for Mesh {
    const TYPE_NAME: &'static str = "Mesh";

    fn group_name(&self) -> ObjectName {
        self.group
    }

    fn size_in_bytes(&self) -> usize {
        self.geometry.vertex_data.len() * 4
            + self.geometry.indices.len() * 2
            + self.skinning.len() * std::mem::size_of::<VertexBoneAttachment>()
    }
}

impl Reflect for Mesh {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Mesh>> = LazyLock::new(|| {
            Schema::<Mesh>::new("Mesh")
                .readonly("VertexCount", ValueKind::UInt, |m| m.vertex_count().into())
                .readonly("TriangleCount", ValueKind::UInt, |m| m.triangle_count().into())
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Serializable, Value};

    /// Hand-built file: 3 vertices, stride 24, 3 indices, not skinned.
    fn triangle_file() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"GEMesh  ");
        for v in [3u32, 3, 24, 0, 0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&[0xAB; 36]);
        for i in 0..18 {
            buf.extend_from_slice(&(i as f32 * 0.5).to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            buf.extend_from_slice(&i.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_decode_hand_built() {
        let mesh = Mesh::from_bytes(ObjectName::new("tri"), ObjectName::EMPTY, &triangle_file()).unwrap();
        let g = mesh.geometry();
        assert_eq!(g.vertex_count, 3);
        assert_eq!(g.floats_per_vertex(), 6);
        assert_eq!(g.vertex_data.len(), 18);
        assert_eq!(g.vertex(1).unwrap(), &[3.0, 3.5, 4.0, 4.5, 5.0, 5.5]);
        assert_eq!(g.indices, vec![0, 1, 2]);
        assert!(!mesh.is_skinned());
        assert!(!mesh.uses_texture());
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_skinned_round_trip() {
        let quad = Primitive::quad(1.0);
        let base = Mesh::from_primitive(ObjectName::new("skinned"), &quad).unwrap();
        let skinning = (0..4 * BONE_ATTACHMENTS_PER_VERTEX)
            .map(|i| VertexBoneAttachment {
                bone_index: (i % 3) as u32,
                weight: if i % BONE_ATTACHMENTS_PER_VERTEX == 0 { 1.0 } else { 0.0 },
            })
            .collect();
        let mesh = Mesh::from_parts(
            base.name,
            ObjectName::new("Characters"),
            base.geometry.clone(),
            true,
            skinning,
        )
        .unwrap();

        let mut buf = Vec::new();
        mesh.write(&mut buf).unwrap();
        assert_eq!(buf.len(), mesh.encoded_len());

        let back = Mesh::from_bytes(mesh.name, mesh.group, &buf).unwrap();
        assert_eq!(back, mesh);
        assert_eq!(back.vertex_bone_attachments(2).unwrap().len(), BONE_ATTACHMENTS_PER_VERTEX);
        assert_eq!(back.bone_attachment(8).unwrap().weight, 1.0);
    }

    #[test]
    fn test_packed_round_trip() {
        let mesh = Mesh::from_primitive(ObjectName::new("cube"), &Primitive::cube(1.0)).unwrap();
        let mut buf = Vec::new();
        mesh.write_packed(&mut buf).unwrap();
        let back = Mesh::read_packed(mesh.name, ObjectName::EMPTY, &mut ByteReader::new(&buf)).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn test_truncated_and_bad_magic() {
        let file = triangle_file();
        let err = Mesh::from_bytes(ObjectName::EMPTY, ObjectName::EMPTY, &file[..file.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));

        let mut bad = file.clone();
        bad[0] = b'X';
        let err = Mesh::from_bytes(ObjectName::EMPTY, ObjectName::EMPTY, &bad).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_readonly_properties() {
        let mut mesh = Mesh::from_primitive(ObjectName::new("q"), &Primitive::quad(1.0)).unwrap();
        assert_eq!(mesh.get(ObjectName::new("VertexCount")).unwrap(), Value::UInt(4));
        assert_eq!(mesh.get(ObjectName::new("TriangleCount")).unwrap(), Value::UInt(2));
        assert!(matches!(
            mesh.set(ObjectName::new("VertexCount"), &Value::UInt(1)),
            Err(Error::ReadOnlyProperty(_))
        ));
    }

    #[test]
    fn test_from_arrays_validates_lengths() {
        let q = Primitive::quad(1.0);
        let err = Mesh::from_arrays(ObjectName::EMPTY, &q.positions, &q.normals[..3], &q.tex_coords, &q.indices);
        assert!(err.is_err());
    }
}

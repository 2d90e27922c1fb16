//! Bone hierarchies in XML (`.skeleton.xml`) and packed (`.skeleton.ge`) form.
//!
//! Both forms list bones in index order. The first bone is the root and is
//! its own parent; every other bone names an earlier bone as parent.
//!
//! Packed layout, written with [`Value`] stream encoding:
//!
//! ```text
//! Byte        bone count
//! per bone:
//!   ObjectName  name
//!   Byte        parent index
//!   Vector3     bind translation
//!   Vector3     bind rotation (Euler degrees)
//!   Vector3     bind scale
//!   Float       size
//!   Byte        child count
//!   Byte * n    child indices
//! ```

use std::io::Write;

use smallvec::SmallVec;

use super::{ContentFormat, ContentKind, ContentSource, Resource};
use crate::core::{Named, ObjectName, Value, ValueKind, XmlNode};
use crate::util::{compose_trs, ByteReader, Error, Mat4, Result, Rotation, Vec3};

/// One bone and its bind pose.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    name: ObjectName,
    index: usize,
    parent_index: usize,
    children: SmallVec<[usize; 4]>,
    bind_translation: Vec3,
    bind_rotation: Rotation,
    bind_scale: Vec3,
    bind_matrix: Mat4,
    inverse_bind_matrix: Mat4,
    size: f32,
}

impl Bone {
    /// Bone with an identity bind pose whose parent is itself.
    pub fn new(index: usize, name: ObjectName) -> Self {
        Self {
            name,
            index,
            parent_index: index,
            children: SmallVec::new(),
            bind_translation: Vec3::ZERO,
            bind_rotation: Rotation::IDENTITY,
            bind_scale: Vec3::ONE,
            bind_matrix: Mat4::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
            size: 0.0,
        }
    }

    pub fn with_parent(mut self, parent_index: usize) -> Self {
        self.parent_index = parent_index;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the bind pose; rotation is Euler degrees.
    pub fn with_bind_pose(mut self, translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        self.set_bind_pose(translation, Rotation::from_euler_degrees(rotation_degrees), scale);
        self
    }

    pub fn with_child(mut self, child: usize) -> Self {
        self.children.push(child);
        self
    }

    /// Set the bind pose and recompute both cached matrices.
    pub fn set_bind_pose(&mut self, translation: Vec3, rotation: Rotation, scale: Vec3) {
        self.bind_translation = translation;
        self.bind_rotation = rotation;
        self.bind_scale = scale;
        self.bind_matrix = compose_trs(translation, &rotation, scale);
        self.inverse_bind_matrix = self.bind_matrix.inverse();
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn parent_index(&self) -> usize {
        self.parent_index
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index == self.index
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn bind_matrix(&self) -> &Mat4 {
        &self.bind_matrix
    }

    #[inline]
    pub fn inverse_bind_matrix(&self) -> &Mat4 {
        &self.inverse_bind_matrix
    }

    pub fn bind_translation(&self) -> Vec3 {
        self.bind_translation
    }

    pub fn bind_rotation(&self) -> &Rotation {
        &self.bind_rotation
    }

    pub fn bind_scale(&self) -> Vec3 {
        self.bind_scale
    }
}

impl Named for Bone {
    fn name(&self) -> ObjectName {
        self.name
    }
}

/// Skeleton resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    name: ObjectName,
    bones: Vec<Bone>,
}

impl Skeleton {
    pub const SUBDIR: &'static str = "Meshes";
    pub const XML_EXTENSION: &'static str = "skeleton.xml";
    pub const BINARY_EXTENSION: &'static str = "skeleton.ge";

    /// Build from bones, checking the tree invariants.
    pub fn new(name: ObjectName, bones: Vec<Bone>) -> Result<Self> {
        let skeleton = Self { name, bones };
        skeleton.validate()?;
        Ok(skeleton)
    }

    /// Load `Meshes/<name>.skeleton.{xml,ge}` from a content source.
    pub fn load(source: &dyn ContentSource, name: &str, format: ContentFormat) -> Result<Self> {
        let _span = tracing::debug_span!("load_skeleton", name).entered();
        let id = ObjectName::new(name);
        match format {
            ContentFormat::Xml => {
                let data = source.read(ContentKind::GenericTextData, Self::SUBDIR, name, Self::XML_EXTENSION)?;
                Self::from_xml(id, &XmlNode::parse_bytes(&data)?)
            }
            ContentFormat::Binary => {
                let data = source.read(ContentKind::GenericBinaryData, Self::SUBDIR, name, Self::BINARY_EXTENSION)?;
                Self::read(id, &mut ByteReader::new(&data))
            }
        }
    }

    /// Decode the `<Skeleton>` element.
    pub fn from_xml(name: ObjectName, node: &XmlNode) -> Result<Self> {
        if node.name != "Skeleton" {
            return Err(Error::invalid(format!("expected <Skeleton>, found <{}>", node.name)));
        }
        let declared = Value::parse(ValueKind::UInt, node.required_attribute("bonesCount")?).as_uint()? as usize;

        let mut bones = Vec::with_capacity(declared);
        for (index, xml_bone) in node.children_named("Bone").enumerate() {
            let mut bone = Bone::new(index, ObjectName::new(xml_bone.attribute("name").unwrap_or("")));
            if let Some(parent) = xml_bone.attribute("parentIndex") {
                bone.parent_index = Value::parse(ValueKind::UInt, parent).as_uint()? as usize;
            } else {
                bone.parent_index = 0;
            }

            let vec3 = |attr: &str| -> Result<Vec3> {
                Value::parse(ValueKind::Vector3, xml_bone.attribute(attr).unwrap_or("")).as_vector3()
            };
            let translation = vec3("bindT")?;
            let rotation = vec3("bindR")?;
            let scale = vec3("bindS")?;
            bone.set_bind_pose(translation, Rotation::from_euler_degrees(rotation), scale);
            bone.size = Value::parse(ValueKind::Float, xml_bone.attribute("size").unwrap_or("")).as_float()?;

            if let Some(children) = xml_bone.child("Children") {
                for child in children.children_named("Child") {
                    let index = Value::parse(ValueKind::UInt, child.required_attribute("index")?).as_uint()?;
                    bone.children.push(index as usize);
                }
            }
            bones.push(bone);
        }

        if bones.len() != declared {
            return Err(Error::invalid(format!(
                "skeleton declares {} bones but lists {}",
                declared,
                bones.len()
            )));
        }
        tracing::debug!(skeleton = %name, bones = bones.len(), "decoded skeleton xml");
        Self::new(name, bones)
    }

    /// Decode the packed form.
    pub fn read(name: ObjectName, r: &mut ByteReader<'_>) -> Result<Self> {
        let count = Value::read(ValueKind::Byte, r)?.as_byte()? as usize;
        let mut bones = Vec::with_capacity(count);

        for index in 0..count {
            let bone_name = Value::read(ValueKind::ObjectName, r)?.as_object_name()?;
            let mut bone = Bone::new(index, bone_name);
            bone.parent_index = Value::read(ValueKind::Byte, r)?.as_byte()? as usize;
            let translation = Value::read(ValueKind::Vector3, r)?.as_vector3()?;
            let rotation = Value::read(ValueKind::Vector3, r)?.as_vector3()?;
            let scale = Value::read(ValueKind::Vector3, r)?.as_vector3()?;
            bone.set_bind_pose(translation, Rotation::from_euler_degrees(rotation), scale);
            bone.size = Value::read(ValueKind::Float, r)?.as_float()?;

            let child_count = Value::read(ValueKind::Byte, r)?.as_byte()?;
            for _ in 0..child_count {
                bone.children.push(Value::read(ValueKind::Byte, r)?.as_byte()? as usize);
            }
            bones.push(bone);
        }

        tracing::debug!(skeleton = %name, bones = count, "decoded packed skeleton");
        Self::new(name, bones)
    }

    /// Encode the packed form.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        Value::Byte(byte_index(self.bones.len(), "bone count")?).write(w)?;
        for bone in &self.bones {
            Value::ObjectName(bone.name).write(w)?;
            Value::Byte(byte_index(bone.parent_index, "parent index")?).write(w)?;
            Value::Vector3(bone.bind_translation).write(w)?;
            Value::Vector3(bone.bind_rotation.euler_degrees()).write(w)?;
            Value::Vector3(bone.bind_scale).write(w)?;
            Value::Float(bone.size).write(w)?;
            Value::Byte(byte_index(bone.children.len(), "child count")?).write(w)?;
            for &child in &bone.children {
                Value::Byte(byte_index(child, "child index")?).write(w)?;
            }
        }
        Ok(())
    }

    /// Encode as a `<Skeleton>` element.
    pub fn to_xml(&self) -> XmlNode {
        let mut root = XmlNode::new("Skeleton").with_attribute("bonesCount", self.bones.len().to_string());
        for bone in &self.bones {
            let mut node = XmlNode::new("Bone")
                .with_attribute("name", bone.name.to_name_string())
                .with_attribute("parentIndex", bone.parent_index.to_string())
                .with_attribute("bindT", Value::Vector3(bone.bind_translation).to_string())
                .with_attribute("bindR", Value::Vector3(bone.bind_rotation.euler_degrees()).to_string())
                .with_attribute("bindS", Value::Vector3(bone.bind_scale).to_string())
                .with_attribute("size", Value::Float(bone.size).to_string());
            if !bone.children.is_empty() {
                let mut children = XmlNode::new("Children");
                for child in &bone.children {
                    children.add_child(XmlNode::new("Child").with_attribute("index", child.to_string()));
                }
                node.add_child(children);
            }
            root.add_child(node);
        }
        root
    }

    /// Check that the bones form a single tree rooted at bone 0.
    pub fn validate(&self) -> Result<()> {
        let count = self.bones.len();
        let mut roots = 0;
        for (i, bone) in self.bones.iter().enumerate() {
            if bone.index != i {
                return Err(Error::invalid(format!("bone {} stored at position {}", bone.index, i)));
            }
            if bone.parent_index > i {
                return Err(Error::invalid(format!(
                    "bone {} has parent {} which does not precede it",
                    i, bone.parent_index
                )));
            }
            if bone.is_root() {
                roots += 1;
            }
            if let Some(&bad) = bone.children.iter().find(|&&c| c >= count) {
                return Err(Error::invalid(format!("bone {} lists missing child {}", i, bad)));
            }
        }
        if count > 0 && roots != 1 {
            return Err(Error::invalid(format!("skeleton has {} roots", roots)));
        }
        Ok(())
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn find_bone(&self, name: ObjectName) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn root(&self) -> Option<&Bone> {
        self.bones.iter().find(|b| b.is_root())
    }

    /// Walk parent links from `index` up to the root.
    ///
    /// Returns the root index and the number of steps taken, or `None` if the
    /// walk does not terminate within `bone_count` steps.
    pub fn walk_to_root(&self, index: usize) -> Option<(usize, usize)> {
        let mut current = index;
        for steps in 0..=self.bones.len() {
            let bone = self.bones.get(current)?;
            if bone.is_root() {
                return Some((current, steps));
            }
            current = bone.parent_index;
        }
        None
    }
}

fn byte_index(value: usize, what: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::invalid(format!("{} {} does not fit in a byte", what, value)))
}

impl Named for Skeleton {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for Skeleton {
    const TYPE_NAME: &'static str = "Skeleton";

    fn group_name(&self) -> ObjectName {
        ObjectName::EMPTY
    }

    fn size_in_bytes(&self) -> usize {
        self.bones.len() * std::mem::size_of::<Bone>()
    }
}

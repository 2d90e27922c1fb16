//! Skeletal animations (`.animation.ge`) and animation sets.
//!
//! # Animation file
//!
//! ```text
//! "GEMeshAnimation "              16 bytes
//! name                            32 bytes, unused on load
//! keyFramesCount  u32
//! bonesCount      u32
//! reserved                        40 bytes
//! keyFramesCount * bonesCount records, keyframe-major:
//!   time f32, position 3*f32, rotation 3*f32 (Euler degrees), scale 3*f32
//! ```
//!
//! # Animation set manifest
//!
//! `Animations/<set>.animationset.xml`:
//!
//! ```xml
//! <AnimationSet>
//!   <Animation name="Walk" fileName="walk" applyRootMotionZ="false"/>
//! </AnimationSet>
//! ```
//!
//! with each animation read from `Animations/<set>/<fileName>.animation.ge`.
//! The packed manifest `Animations/<set>.animationset.ge` embeds the files:
//! a `Byte` count, then per animation `ObjectName` name, `String` file name,
//! three `Bool` root-motion flags, a `UInt` byte length and the file itself.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::{ContentFormat, ContentKind, ContentSource, Resource};
use crate::core::{Named, ObjectManager, ObjectName, Value, ValueKind, XmlNode};
use crate::util::{ByteReader, Error, Result, Rotation, Vec3};

/// Magic tag at the start of an animation file.
pub const ANIMATION_TAG: &[u8; 16] = b"GEMeshAnimation ";

/// Width of the name field after the tag.
pub const ANIMATION_NAME_BYTES: usize = 32;

/// Reserved bytes after the animation header.
pub const ANIMATION_HEADER_RESERVED_BYTES: usize = 40;

/// Time marking a cell that carries no sample.
pub const NO_SAMPLE_TIME: f32 = -1.0;

/// Pose of one bone at one sampled time.
///
/// The default is an empty cell: no sample time and an all-zero pose,
/// scale included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationKeyFrame {
    pub time: f32,
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
}

impl Default for AnimationKeyFrame {
    fn default() -> Self {
        Self {
            time: NO_SAMPLE_TIME,
            position: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: Vec3::ZERO,
        }
    }
}

/// Dense `keyframe x bone` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    name: ObjectName,
    file_name: String,
    key_frame_count: usize,
    bone_count: usize,
    key_frames: Box<[AnimationKeyFrame]>,
    pub apply_root_motion_x: bool,
    pub apply_root_motion_y: bool,
    pub apply_root_motion_z: bool,
}

impl Animation {
    pub const EXTENSION: &'static str = "animation.ge";

    /// Grid of `key_frame_count * bone_count` empty cells.
    pub fn new(name: ObjectName, key_frame_count: usize, bone_count: usize) -> Self {
        Self {
            name,
            file_name: String::new(),
            key_frame_count,
            bone_count,
            key_frames: vec![AnimationKeyFrame::default(); key_frame_count * bone_count]
                .into_boxed_slice(),
            apply_root_motion_x: true,
            apply_root_motion_y: true,
            apply_root_motion_z: true,
        }
    }

    /// Decode an animation file.
    pub fn read(name: ObjectName, r: &mut ByteReader<'_>) -> Result<Self> {
        r.expect_tag(ANIMATION_TAG)?;
        r.skip(ANIMATION_NAME_BYTES)?;
        let key_frame_count = r.read_u32()? as usize;
        let bone_count = r.read_u32()? as usize;
        r.skip(ANIMATION_HEADER_RESERVED_BYTES)?;

        // 13 floats per record; check before allocating the grid
        let cells = key_frame_count
            .checked_mul(bone_count)
            .ok_or_else(|| Error::invalid("animation grid size overflows"))?;
        let needed = cells.saturating_mul(13 * 4);
        if needed > r.remaining() {
            return Err(Error::UnexpectedEof {
                offset: r.position(),
                needed,
                available: r.remaining(),
            });
        }

        let mut animation = Self::new(name, key_frame_count, bone_count);
        for cell in animation.key_frames.iter_mut() {
            cell.time = r.read_f32()?;
            cell.position = read_vec3(r)?;
            cell.rotation = Rotation::from_euler_degrees(read_vec3(r)?);
            cell.scale = read_vec3(r)?;
        }

        tracing::debug!(animation = %name, key_frame_count, bone_count, "decoded animation");
        Ok(animation)
    }

    pub fn from_bytes(name: ObjectName, data: &[u8]) -> Result<Self> {
        Self::read(name, &mut ByteReader::new(data))
    }

    /// Encode as an animation file.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(ANIMATION_TAG)?;
        let mut name_field = [0u8; ANIMATION_NAME_BYTES];
        let name = self.name.to_name_string();
        let len = name.len().min(ANIMATION_NAME_BYTES - 1);
        name_field[..len].copy_from_slice(&name.as_bytes()[..len]);
        w.write_all(&name_field)?;
        w.write_u32::<LittleEndian>(self.key_frame_count as u32)?;
        w.write_u32::<LittleEndian>(self.bone_count as u32)?;
        w.write_all(&[0u8; ANIMATION_HEADER_RESERVED_BYTES])?;

        for cell in self.key_frames.iter() {
            w.write_f32::<LittleEndian>(cell.time)?;
            write_vec3(w, cell.position)?;
            write_vec3(w, cell.rotation.euler_degrees())?;
            write_vec3(w, cell.scale)?;
        }
        Ok(())
    }

    /// Size of the file encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        ANIMATION_TAG.len()
            + ANIMATION_NAME_BYTES
            + 8
            + ANIMATION_HEADER_RESERVED_BYTES
            + self.key_frames.len() * 13 * 4
    }

    #[inline]
    pub fn key_frame_count(&self) -> usize {
        self.key_frame_count
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    /// File name (without extension) the animation was loaded from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    pub fn key_frame(&self, frame: usize, bone: usize) -> Option<&AnimationKeyFrame> {
        if frame >= self.key_frame_count || bone >= self.bone_count {
            return None;
        }
        self.key_frames.get(frame * self.bone_count + bone)
    }

    pub fn key_frame_mut(&mut self, frame: usize, bone: usize) -> Option<&mut AnimationKeyFrame> {
        if frame >= self.key_frame_count || bone >= self.bone_count {
            return None;
        }
        self.key_frames.get_mut(frame * self.bone_count + bone)
    }

    /// All bone cells of one keyframe.
    pub fn key_frame_row(&self, frame: usize) -> Option<&[AnimationKeyFrame]> {
        if frame >= self.key_frame_count {
            return None;
        }
        let start = frame * self.bone_count;
        self.key_frames.get(start..start + self.bone_count)
    }

    /// Time of a keyframe: the first non-negative time among its bone cells.
    pub fn key_frame_time(&self, frame: usize) -> Option<f32> {
        self.key_frame_row(frame)?
            .iter()
            .map(|cell| cell.time)
            .find(|&t| t >= 0.0)
    }

    /// Time of the last keyframe that carries one.
    pub fn duration(&self) -> f32 {
        (0..self.key_frame_count)
            .rev()
            .find_map(|i| self.key_frame_time(i))
            .unwrap_or(0.0)
    }
}

impl Named for Animation {
    fn name(&self) -> ObjectName {
        self.name
    }
}

fn read_vec3(r: &mut ByteReader<'_>) -> Result<Vec3> {
    Ok(Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
}

fn write_vec3<W: Write + ?Sized>(w: &mut W, v: Vec3) -> Result<()> {
    w.write_f32::<LittleEndian>(v.x)?;
    w.write_f32::<LittleEndian>(v.y)?;
    w.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

/// Named collection of animations sharing one skeleton.
#[derive(Debug)]
pub struct AnimationSet {
    name: ObjectName,
    animations: ObjectManager<Animation>,
}

impl AnimationSet {
    pub const SUBDIR: &'static str = "Animations";

    pub fn new(name: ObjectName) -> Self {
        Self {
            name,
            animations: ObjectManager::new(),
        }
    }

    /// Manifest file name: `<set>.animationset`.
    pub fn manifest_name(set: &str) -> String {
        format!("{}.animationset", set)
    }

    /// Load `Animations/<name>.animationset.{xml,ge}`.
    pub fn load(source: &dyn ContentSource, name: &str, format: ContentFormat) -> Result<Self> {
        let _span = tracing::debug_span!("load_animation_set", name).entered();
        let manifest = Self::manifest_name(name);
        match format {
            ContentFormat::Xml => {
                let data = source.read(ContentKind::GenericTextData, Self::SUBDIR, &manifest, "xml")?;
                let node = XmlNode::parse_bytes(&data)?;
                Self::from_xml_manifest(name, &node, source)
            }
            ContentFormat::Binary => {
                let data = source.read(ContentKind::GenericBinaryData, Self::SUBDIR, &manifest, "ge")?;
                Self::read_packed(ObjectName::new(name), &mut ByteReader::new(&data))
            }
        }
    }

    /// Decode an XML manifest, reading every referenced animation file.
    pub fn from_xml_manifest(set: &str, node: &XmlNode, source: &dyn ContentSource) -> Result<Self> {
        if node.name != "AnimationSet" {
            return Err(Error::invalid(format!("expected <AnimationSet>, found <{}>", node.name)));
        }
        let subdir = format!("{}/{}", Self::SUBDIR, set);
        let mut result = Self::new(ObjectName::new(set));

        for xml_animation in node.children_named("Animation") {
            let name = ObjectName::new(xml_animation.required_attribute("name")?);
            let file_name = xml_animation.required_attribute("fileName")?;
            let data = source.read(ContentKind::GenericBinaryData, &subdir, file_name, Animation::EXTENSION)?;

            let mut animation = Animation::from_bytes(name, &data)?;
            animation.set_file_name(file_name);
            let flag = |attr: &str, default: bool| {
                xml_animation
                    .attribute(attr)
                    .map_or(default, |v| Value::parse(ValueKind::Bool, v) == Value::Bool(true))
            };
            animation.apply_root_motion_x = flag("applyRootMotionX", true);
            animation.apply_root_motion_y = flag("applyRootMotionY", true);
            animation.apply_root_motion_z = flag("applyRootMotionZ", true);
            result.animations.add(animation)?;
        }
        Ok(result)
    }

    /// Decode a packed manifest with embedded animations.
    pub fn read_packed(name: ObjectName, r: &mut ByteReader<'_>) -> Result<Self> {
        let count = Value::read(ValueKind::Byte, r)?.as_byte()?;
        let mut result = Self::new(name);

        for _ in 0..count {
            let animation_name = Value::read(ValueKind::ObjectName, r)?.as_object_name()?;
            let file_name = Value::read(ValueKind::String, r)?;
            let x = Value::read(ValueKind::Bool, r)?.as_bool()?;
            let y = Value::read(ValueKind::Bool, r)?.as_bool()?;
            let z = Value::read(ValueKind::Bool, r)?.as_bool()?;
            // Byte length of the embedded file; the file is self-delimiting
            Value::read(ValueKind::UInt, r)?;

            let mut animation = Animation::read(animation_name, r)?;
            animation.set_file_name(file_name.as_str()?);
            animation.apply_root_motion_x = x;
            animation.apply_root_motion_y = y;
            animation.apply_root_motion_z = z;
            result.animations.add(animation)?;
        }
        Ok(result)
    }

    /// Encode the packed manifest. Animations are written sorted by file name.
    pub fn write_packed<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let count = u8::try_from(self.animations.count())
            .map_err(|_| Error::invalid("animation set holds more than 255 animations"))?;
        Value::Byte(count).write(w)?;

        for animation in self.sorted() {
            Value::ObjectName(animation.name).write(w)?;
            Value::String(animation.file_name.clone()).write(w)?;
            Value::Bool(animation.apply_root_motion_x).write(w)?;
            Value::Bool(animation.apply_root_motion_y).write(w)?;
            Value::Bool(animation.apply_root_motion_z).write(w)?;
            Value::UInt(animation.encoded_len() as u32).write(w)?;
            animation.write(w)?;
        }
        Ok(())
    }

    /// XML manifest referencing each animation by file name.
    pub fn to_xml_manifest(&self) -> XmlNode {
        let mut root = XmlNode::new("AnimationSet");
        for animation in self.sorted() {
            root.add_child(
                XmlNode::new("Animation")
                    .with_attribute("name", animation.name.to_name_string())
                    .with_attribute("fileName", animation.file_name.clone())
                    .with_attribute("applyRootMotionX", animation.apply_root_motion_x.to_string())
                    .with_attribute("applyRootMotionY", animation.apply_root_motion_y.to_string())
                    .with_attribute("applyRootMotionZ", animation.apply_root_motion_z.to_string()),
            );
        }
        root
    }

    fn sorted(&self) -> Vec<&Animation> {
        let mut list: Vec<&Animation> = self.animations.iter().collect();
        list.sort_by(|a, b| a.file_name.cmp(&b.file_name).then(a.name.id().cmp(&b.name.id())));
        list
    }

    pub fn add(&mut self, animation: Animation) -> Result<()> {
        self.animations.add(animation).map(|_| ())
    }

    pub fn animation(&self, name: ObjectName) -> Option<&Animation> {
        self.animations.get(name)
    }

    pub fn animations(&self) -> &ObjectManager<Animation> {
        &self.animations
    }

    pub fn len(&self) -> usize {
        self.animations.count()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

impl Named for AnimationSet {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for AnimationSet {
    const TYPE_NAME: &'static str = "AnimationSet";

    fn group_name(&self) -> ObjectName {
        ObjectName::EMPTY
    }

    fn size_in_bytes(&self) -> usize {
        self.animations
            .iter()
            .map(|a| a.key_frames.len() * std::mem::size_of::<AnimationKeyFrame>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;

    fn sample(name: &str, frames: usize, bones: usize) -> Animation {
        let mut a = Animation::new(ObjectName::new(name), frames, bones);
        a.set_file_name(name.to_lowercase());
        for f in 0..frames {
            for b in 0..bones {
                let cell = a.key_frame_mut(f, b).unwrap();
                cell.time = f as f32 / 30.0;
                cell.position = Vec3::new(f as f32, b as f32, 0.5);
                cell.rotation = Rotation::from_euler_degrees(Vec3::new(0.0, 15.0 * b as f32, 0.0));
                cell.scale = Vec3::ONE;
            }
        }
        a
    }

    #[test]
    fn test_grid_round_trip() {
        let anim = sample("Walk", 4, 3);
        let mut buf = Vec::new();
        anim.write(&mut buf).unwrap();
        assert_eq!(buf.len(), anim.encoded_len());
        assert_eq!(&buf[..16], b"GEMeshAnimation ");

        let back = Animation::from_bytes(anim.name, &buf).unwrap();
        assert_eq!(back.key_frame_count(), 4);
        assert_eq!(back.bone_count(), 3);
        for f in 0..4 {
            for b in 0..3 {
                let x = anim.key_frame(f, b).unwrap();
                let y = back.key_frame(f, b).unwrap();
                assert_eq!(x.time, y.time);
                assert_eq!(x.position, y.position);
                assert!(x.rotation.quaternion().abs_diff_eq(y.rotation.quaternion(), 1e-6));
            }
        }
        assert!(back.key_frame(4, 0).is_none());
        assert!(back.key_frame(0, 3).is_none());
        assert!(back.apply_root_motion_x && back.apply_root_motion_y && back.apply_root_motion_z);
    }

    #[test]
    fn test_key_frame_time_first_non_negative() {
        let mut anim = Animation::new(ObjectName::new("Sparse"), 2, 3);
        anim.key_frame_mut(0, 1).unwrap().time = 0.5;
        anim.key_frame_mut(0, 2).unwrap().time = 0.75;
        assert_eq!(anim.key_frame_time(0), Some(0.5));

        let empty = anim.key_frame(1, 0).unwrap();
        assert_eq!(empty.time, NO_SAMPLE_TIME);
        assert_eq!(empty.position, Vec3::ZERO);
        assert_eq!(empty.scale, Vec3::ZERO);
        assert_eq!(empty.rotation.euler_degrees(), Vec3::ZERO);
        assert_eq!(anim.key_frame_time(1), None);
        assert_eq!(anim.key_frame_time(2), None);
        assert_eq!(anim.duration(), 0.5);
    }

    #[test]
    fn test_truncated_grid() {
        let anim = sample("Run", 2, 2);
        let mut buf = Vec::new();
        anim.write(&mut buf).unwrap();
        buf.pop();
        assert!(matches!(
            Animation::from_bytes(anim.name, &buf),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_packed_set_round_trip() {
        let mut set = AnimationSet::new(ObjectName::new("Hero"));
        let mut walk = sample("Walk", 3, 2);
        walk.apply_root_motion_z = false;
        set.add(walk).unwrap();
        set.add(sample("Idle", 1, 2)).unwrap();
        assert!(set.add(sample("Idle", 1, 2)).is_err());

        let mut buf = Vec::new();
        set.write_packed(&mut buf).unwrap();
        let back = AnimationSet::read_packed(set.name, &mut ByteReader::new(&buf)).unwrap();
        assert_eq!(back.len(), 2);

        let walk = back.animation(ObjectName::new("Walk")).unwrap();
        assert_eq!(walk.file_name(), "walk");
        assert!(walk.apply_root_motion_x);
        assert!(!walk.apply_root_motion_z);
        assert_eq!(walk.key_frame_count(), 3);
    }

    #[test]
    fn test_xml_manifest_loads_files() {
        let source = MemoryContentSource::new();
        let walk = sample("Walk", 2, 2);
        let mut bytes = Vec::new();
        walk.write(&mut bytes).unwrap();
        source.insert("Animations/Hero", "walk", "animation.ge", bytes);

        let manifest = r#"<AnimationSet>
            <Animation name="Walk" fileName="walk" applyRootMotionY="false"/>
        </AnimationSet>"#;
        source.insert("Animations", "Hero.animationset", "xml", manifest);

        let set = AnimationSet::load(&source, "Hero", ContentFormat::Xml).unwrap();
        let loaded = set.animation(ObjectName::new("Walk")).unwrap();
        assert!(loaded.apply_root_motion_x);
        assert!(!loaded.apply_root_motion_y);
        assert_eq!(loaded.key_frame_time(1), walk.key_frame_time(1));

        let node = set.to_xml_manifest();
        assert_eq!(node.children[0].attribute("applyRootMotionY"), Some("false"));
    }

    #[test]
    fn test_missing_animation_file() {
        let source = MemoryContentSource::new();
        source.insert(
            "Animations",
            "Hero.animationset",
            "xml",
            r#"<AnimationSet><Animation name="Jump" fileName="jump"/></AnimationSet>"#,
        );
        let err = AnimationSet::load(&source, "Hero", ContentFormat::Xml).unwrap_err();
        assert!(matches!(err, Error::ContentNotFound(_)));
    }
}

//! Materials: a shader program plus its fixed inputs.

use std::sync::LazyLock;

use crate::content::{ListedResource, Resource};
use crate::core::{Named, ObjectName, Reflect, Schema, ValueKind};
use crate::util::{Color, Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendingMode {
    #[default]
    None,
    Alpha,
    Additive,
}

impl BlendingMode {
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BlendingMode::None),
            1 => Ok(BlendingMode::Alpha),
            2 => Ok(BlendingMode::Additive),
            _ => Err(Error::invalid(format!("invalid blending mode {}", value))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    name: ObjectName,
    group: ObjectName,
    pub shader_program: ObjectName,
    pub diffuse_color: Color,
    pub diffuse_texture: ObjectName,
    pub blending_mode: BlendingMode,
    pub batch_rendering: bool,
}

impl Material {
    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            shader_program: ObjectName::EMPTY,
            diffuse_color: Color::WHITE,
            diffuse_texture: ObjectName::EMPTY,
            blending_mode: BlendingMode::None,
            batch_rendering: false,
        }
    }

    pub fn has_texture(&self) -> bool {
        !self.diffuse_texture.is_empty()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(ObjectName::EMPTY, ObjectName::EMPTY)
    }
}

impl Named for Material {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for Material {
    const TYPE_NAME: &'static str = "Material";

    fn group_name(&self) -> ObjectName {
        self.group
    }
}

impl ListedResource for Material {
    const SUBDIR: &'static str = "Materials";
    const LIST_SUFFIX: &'static str = "materials";
    const LIST_ROOT: &'static str = "MaterialList";
    const ELEMENT: &'static str = "Material";

    fn create(name: ObjectName, group: ObjectName) -> Self {
        Self::new(name, group)
    }
}

impl Reflect for Material {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Material>> = LazyLock::new(|| {
            Schema::<Material>::new("Material")
                .readonly("Name", ValueKind::ObjectName, |m| m.name.into())
                .property("ShaderProgram", ValueKind::ObjectName, |m| m.shader_program.into(), |m, v| {
                    m.shader_program = v.as_object_name()?;
                    Ok(())
                })
                .property("DiffuseColor", ValueKind::Color, |m| m.diffuse_color.into(), |m, v| {
                    m.diffuse_color = v.as_color()?;
                    Ok(())
                })
                .property("DiffuseTextureName", ValueKind::ObjectName, |m| m.diffuse_texture.into(), |m, v| {
                    m.diffuse_texture = v.as_object_name()?;
                    Ok(())
                })
                .property("BlendingMode", ValueKind::Byte, |m| (m.blending_mode as u8).into(), |m, v| {
                    m.blending_mode = BlendingMode::from_byte(v.as_byte()?)?;
                    Ok(())
                })
                .property("BatchRendering", ValueKind::Bool, |m| m.batch_rendering.into(), |m, v| {
                    m.batch_rendering = v.as_bool()?;
                    Ok(())
                })
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Serializable, Value, XmlNode};
    use crate::util::ByteReader;

    #[test]
    fn test_xml_and_stream() {
        let node = XmlNode::parse(
            r#"<Material name="Glass" ShaderProgram="Lit" DiffuseColor="r:0.5 g:0.5 b:1 a:0.25" BlendingMode="1"/>"#,
        )
        .unwrap();
        let mut m = Material::new(ObjectName::new("Glass"), ObjectName::new("default"));
        m.load_from_xml(&node).unwrap();
        assert_eq!(m.blending_mode, BlendingMode::Alpha);
        assert_eq!(m.diffuse_color.alpha, 0.25);
        assert!(!m.has_texture());
        assert!(!m.batch_rendering);

        let mut buf = Vec::new();
        m.save_to_stream(&mut buf).unwrap();
        let mut back = Material::new(m.name(), m.group_name());
        back.load_from_stream(&mut ByteReader::new(&buf)).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_name_is_read_only() {
        let mut m = Material::default();
        assert_eq!(m.get(ObjectName::new("Name")).unwrap(), Value::ObjectName(ObjectName::EMPTY));
        assert!(matches!(
            m.set(ObjectName::new("Name"), &Value::ObjectName(ObjectName::new("x"))),
            Err(Error::ReadOnlyProperty(_))
        ));
    }
}

//! Shader program descriptors.

use std::sync::LazyLock;

use crate::content::{ListedResource, Resource};
use crate::core::{Named, ObjectName, Reflect, Schema, Value, ValueKind};
use crate::util::{Error, Result};

/// Depth buffer usage of a shader program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DepthBufferMode {
    #[default]
    NoDepth,
    TestOnly,
    TestAndWrite,
}

impl DepthBufferMode {
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DepthBufferMode::NoDepth),
            1 => Ok(DepthBufferMode::TestOnly),
            2 => Ok(DepthBufferMode::TestAndWrite),
            _ => Err(Error::invalid(format!("invalid depth buffer mode {}", value))),
        }
    }
}

/// A named uniform and its value kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderParameter {
    pub name: ObjectName,
    pub kind: ValueKind,
}

impl Default for ShaderParameter {
    fn default() -> Self {
        Self {
            name: ObjectName::EMPTY,
            kind: ValueKind::Float,
        }
    }
}

impl Reflect for ShaderParameter {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<ShaderParameter>> = LazyLock::new(|| {
            Schema::<ShaderParameter>::new("ShaderParameter")
                .property("Name", ValueKind::ObjectName, |p| p.name.into(), |p, v| {
                    p.name = v.as_object_name()?;
                    Ok(())
                })
                .property("Type", ValueKind::String, |p| p.kind.name().into(), |p, v| {
                    p.kind = ValueKind::from_name(v.as_str()?)?;
                    Ok(())
                })
        });
        &SCHEMA
    }
}

/// Parameter placed in a packed constant buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterSlot {
    pub name: ObjectName,
    pub kind: ValueKind,
    /// Byte offset from the start of the buffer.
    pub offset: usize,
}

/// Vertex and fragment sources plus their parameter layouts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderProgram {
    name: ObjectName,
    group: ObjectName,
    pub vertex_source: String,
    pub fragment_source: String,
    pub depth_buffer_mode: DepthBufferMode,
    pub vertex_parameters: Vec<ShaderParameter>,
    pub fragment_parameters: Vec<ShaderParameter>,
}

impl ShaderProgram {
    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            ..Default::default()
        }
    }

    /// Vertex parameters with offsets packed back to back.
    pub fn vertex_layout(&self) -> Vec<ParameterSlot> {
        layout(&self.vertex_parameters)
    }

    pub fn fragment_layout(&self) -> Vec<ParameterSlot> {
        layout(&self.fragment_parameters)
    }
}

fn layout(parameters: &[ShaderParameter]) -> Vec<ParameterSlot> {
    let mut offset = 0;
    parameters
        .iter()
        .map(|p| {
            let slot = ParameterSlot {
                name: p.name,
                kind: p.kind,
                offset,
            };
            offset += Value::default_for(p.kind).size();
            slot
        })
        .collect()
}

impl Named for ShaderProgram {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for ShaderProgram {
    const TYPE_NAME: &'static str = "ShaderProgram";

    fn group_name(&self) -> ObjectName {
        self.group
    }
}

impl ListedResource for ShaderProgram {
    const SUBDIR: &'static str = "Shaders";
    const LIST_SUFFIX: &'static str = "shaders";
    const LIST_ROOT: &'static str = "ShaderProgramList";
    const ELEMENT: &'static str = "ShaderProgram";

    fn create(name: ObjectName, group: ObjectName) -> Self {
        Self::new(name, group)
    }
}

impl Reflect for ShaderProgram {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<ShaderProgram>> = LazyLock::new(|| {
            Schema::<ShaderProgram>::new("ShaderProgram")
                .property("VertexSource", ValueKind::String, |s| s.vertex_source.as_str().into(), |s, v| {
                    s.vertex_source = v.as_str()?.to_owned();
                    Ok(())
                })
                .property("FragmentSource", ValueKind::String, |s| s.fragment_source.as_str().into(), |s, v| {
                    s.fragment_source = v.as_str()?.to_owned();
                    Ok(())
                })
                .property("DepthBufferMode", ValueKind::Byte, |s| (s.depth_buffer_mode as u8).into(), |s, v| {
                    s.depth_buffer_mode = DepthBufferMode::from_byte(v.as_byte()?)?;
                    Ok(())
                })
                .array::<ShaderParameter>(
                    "VertexParameter",
                    |s| &s.vertex_parameters,
                    |s| &mut s.vertex_parameters,
                )
                .array::<ShaderParameter>(
                    "FragmentParameter",
                    |s| &s.fragment_parameters,
                    |s| &mut s.fragment_parameters,
                )
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Serializable, XmlNode};

    const XML: &str = r#"<ShaderProgram name="Lit" VertexSource="lit.vs" FragmentSource="lit.ps" DepthBufferMode="2">
        <VertexParameter Name="WorldViewProjection" Type="Vector3"/>
        <VertexParameter Name="Time" Type="Float"/>
        <FragmentParameter Name="Tint" Type="Color"/>
    </ShaderProgram>"#;

    #[test]
    fn test_load_from_xml_and_layout() {
        let mut shader = ShaderProgram::new(ObjectName::new("Lit"), ObjectName::new("default"));
        shader.load_from_xml(&XmlNode::parse(XML).unwrap()).unwrap();

        assert_eq!(shader.vertex_source, "lit.vs");
        assert_eq!(shader.depth_buffer_mode, DepthBufferMode::TestAndWrite);

        let vertex = shader.vertex_layout();
        assert_eq!(vertex.len(), 2);
        assert_eq!(vertex[0].offset, 0);
        assert_eq!(vertex[1].offset, 12);
        assert_eq!(vertex[1].kind, ValueKind::Float);
        assert_eq!(shader.fragment_layout()[0].kind, ValueKind::Color);
    }

    #[test]
    fn test_unknown_parameter_type() {
        let xml = r#"<ShaderProgram><VertexParameter Name="M" Type="Matrix4"/></ShaderProgram>"#;
        let mut shader = ShaderProgram::default();
        assert!(shader.load_from_xml(&XmlNode::parse(xml).unwrap()).is_err());
    }

    #[test]
    fn test_invalid_depth_mode() {
        let mut shader = ShaderProgram::default();
        let err = shader.set(ObjectName::new("DepthBufferMode"), &Value::Byte(7)).unwrap_err();
        assert!(err.is_format_error());
    }
}

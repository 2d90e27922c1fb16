//! List documents for reflected resources.
//!
//! ```xml
//! <MaterialList>
//!   <Material name="Stone" ShaderProgram="Lit" DiffuseColor="r:1 g:1 b:1 a:1"/>
//! </MaterialList>
//! ```
//!
//! Packed: a `Byte` count, then per instance its `ObjectName` and the
//! stream-encoded properties.

use std::io::Write;

use super::ListedResource;
use crate::core::{Named, ObjectName, Serializable, Value, ValueKind, XmlNode};
use crate::util::{ByteReader, Error, Result};

/// File name (without format extension) of list `list` for `T`.
pub fn list_file_name<T: ListedResource>(list: &str) -> String {
    format!("{}.{}", list, T::LIST_SUFFIX)
}

/// Decode every instance of an XML list. Instances belong to `group`.
pub fn read_list_xml<T: ListedResource>(node: &XmlNode, group: ObjectName) -> Result<Vec<T>> {
    if node.name != T::LIST_ROOT {
        return Err(Error::invalid(format!(
            "expected <{}>, found <{}>",
            T::LIST_ROOT,
            node.name
        )));
    }
    node.children_named(T::ELEMENT)
        .map(|element| {
            let name = ObjectName::new(element.required_attribute("name")?);
            let mut item = T::create(name, group);
            item.load_from_xml(element)?;
            Ok(item)
        })
        .collect()
}

pub fn read_list_packed<T: ListedResource>(r: &mut ByteReader<'_>, group: ObjectName) -> Result<Vec<T>> {
    let count = Value::read(ValueKind::Byte, r)?.as_byte()?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = Value::read(ValueKind::ObjectName, r)?.as_object_name()?;
        let mut item = T::create(name, group);
        item.load_from_stream(r)?;
        items.push(item);
    }
    Ok(items)
}

pub fn write_list_xml<T: ListedResource>(items: &[T]) -> Result<XmlNode> {
    let mut root = XmlNode::new(T::LIST_ROOT);
    for item in items {
        let mut element = XmlNode::new(T::ELEMENT).with_attribute("name", item.name().to_name_string());
        item.save_to_xml(&mut element)?;
        root.add_child(element);
    }
    Ok(root)
}

pub fn write_list_packed<T: ListedResource>(items: &[T], w: &mut dyn Write) -> Result<()> {
    let count = u8::try_from(items.len())
        .map_err(|_| Error::invalid(format!("{} holds more than 255 entries", T::LIST_ROOT)))?;
    Value::Byte(count).write(w)?;
    for item in items {
        Value::ObjectName(item.name()).write(w)?;
        item.save_to_stream(w)?;
    }
    Ok(())
}

/// Convert an XML list document straight to its packed form.
pub fn pack_list<T: ListedResource>(node: &XmlNode, w: &mut dyn Write) -> Result<()> {
    let items = read_list_xml::<T>(node, ObjectName::EMPTY)?;
    write_list_packed(&items, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioEvent;
    use crate::rendering::{BlendingMode, Material};

    const MATERIALS: &str = r#"<MaterialList>
        <Material name="Stone" ShaderProgram="Lit" BatchRendering="true"/>
        <Material name="Glass" ShaderProgram="Lit" BlendingMode="1"/>
    </MaterialList>"#;

    #[test]
    fn test_read_xml_list() {
        let node = XmlNode::parse(MATERIALS).unwrap();
        let items = read_list_xml::<Material>(&node, ObjectName::new("world")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name(), ObjectName::new("Stone"));
        assert!(items[0].batch_rendering);
        assert_eq!(items[1].blending_mode, BlendingMode::Alpha);
    }

    #[test]
    fn test_pack_matches_xml() {
        let node = XmlNode::parse(MATERIALS).unwrap();
        let mut packed = Vec::new();
        pack_list::<Material>(&node, &mut packed).unwrap();

        let group = ObjectName::new("world");
        let from_xml = read_list_xml::<Material>(&node, group).unwrap();
        let from_packed = read_list_packed::<Material>(&mut ByteReader::new(&packed), group).unwrap();
        assert_eq!(from_xml, from_packed);

        let rewritten = write_list_xml(&from_packed).unwrap();
        assert_eq!(read_list_xml::<Material>(&rewritten, group).unwrap(), from_xml);
    }

    #[test]
    fn test_wrong_root_and_missing_name() {
        let node = XmlNode::parse(MATERIALS).unwrap();
        assert!(read_list_xml::<AudioEvent>(&node, ObjectName::EMPTY).is_err());

        let node = XmlNode::parse(r#"<MaterialList><Material ShaderProgram="Lit"/></MaterialList>"#).unwrap();
        assert!(read_list_xml::<Material>(&node, ObjectName::EMPTY).is_err());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(list_file_name::<Material>("default"), "default.materials");
        assert_eq!(list_file_name::<AudioEvent>("sfx"), "sfx.events");
    }
}

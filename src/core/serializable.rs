//! Reflective properties and generic (de)serialization.
//!
//! A type opts in by implementing [`Reflect`], which hands out a static
//! [`Schema`]: an ordered list of typed properties (getter plus optional
//! setter) and an ordered list of property arrays (nested lists of reflective
//! elements). Every `Reflect` type is [`Serializable`] through a blanket impl,
//! which gives it name-based `get`/`set` and the XML and stream encodings.
//!
//! Registration order is the wire order. Reordering properties changes the
//! stream format.
//!
//! # XML layout
//!
//! ```xml
//! <AudioEvent name="Explosion" Volume="0.8">
//!   <AudioFile FileName="boom01"/>
//!   <AudioFile FileName="boom02"/>
//! </AudioEvent>
//! ```
//!
//! One attribute per writable property; one child element per array element,
//! named after the array.
//!
//! # Stream layout
//!
//! For each writable property in registration order, a one byte presence
//! flag followed by the value when the flag is set. Then for each array a
//! `UInt` element count followed by the elements.

use std::any::Any;
use std::fmt;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::{ObjectName, Value, ValueKind, XmlNode};
use crate::util::{ByteReader, Error, Result};

/// Property getter.
pub type Getter<T> = fn(&T) -> Value;

/// Property setter; absent for read-only properties.
pub type Setter<T> = fn(&mut T, &Value) -> Result<()>;

/// A typed, named accessor pair.
pub struct Property<T> {
    name: ObjectName,
    label: &'static str,
    kind: ValueKind,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T> Property<T> {
    #[inline]
    pub fn name(&self) -> ObjectName {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    fn info(&self) -> PropertyInfo {
        PropertyInfo {
            name: self.name,
            label: self.label,
            kind: self.kind,
            read_only: self.setter.is_none(),
        }
    }
}

/// Type-erased description of a property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyInfo {
    pub name: ObjectName,
    /// Attribute name in XML.
    pub label: &'static str,
    pub kind: ValueKind,
    pub read_only: bool,
}

/// Element storage behind a property array.
pub trait ArrayAccess<T>: Send + Sync {
    fn len(&self, owner: &T) -> usize;
    fn element<'a>(&self, owner: &'a T, index: usize) -> Option<&'a dyn Serializable>;
    fn element_mut<'a>(&self, owner: &'a mut T, index: usize) -> Option<&'a mut dyn Serializable>;
    /// Append a default element and return it.
    fn add<'a>(&self, owner: &'a mut T) -> &'a mut dyn Serializable;
    fn remove(&self, owner: &mut T, index: usize) -> Result<()>;
    fn swap(&self, owner: &mut T, a: usize, b: usize) -> Result<()>;
}

/// [`ArrayAccess`] over a `Vec<E>` field.
struct VecAccess<T, E> {
    entries: fn(&T) -> &Vec<E>,
    entries_mut: fn(&mut T) -> &mut Vec<E>,
}

impl<T, E> ArrayAccess<T> for VecAccess<T, E>
where
    T: 'static,
    E: Reflect + Default,
{
    fn len(&self, owner: &T) -> usize {
        (self.entries)(owner).len()
    }

    fn element<'a>(&self, owner: &'a T, index: usize) -> Option<&'a dyn Serializable> {
        (self.entries)(owner)
            .get(index)
            .map(|e| e as &dyn Serializable)
    }

    fn element_mut<'a>(&self, owner: &'a mut T, index: usize) -> Option<&'a mut dyn Serializable> {
        (self.entries_mut)(owner)
            .get_mut(index)
            .map(|e| e as &mut dyn Serializable)
    }

    fn add<'a>(&self, owner: &'a mut T) -> &'a mut dyn Serializable {
        let entries = (self.entries_mut)(owner);
        entries.push(E::default());
        let last = entries.len() - 1;
        &mut entries[last]
    }

    fn remove(&self, owner: &mut T, index: usize) -> Result<()> {
        let entries = (self.entries_mut)(owner);
        if index >= entries.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                count: entries.len(),
            });
        }
        entries.remove(index);
        Ok(())
    }

    fn swap(&self, owner: &mut T, a: usize, b: usize) -> Result<()> {
        let entries = (self.entries_mut)(owner);
        let count = entries.len();
        for index in [a, b] {
            if index >= count {
                return Err(Error::IndexOutOfBounds { index, count });
            }
        }
        entries.swap(a, b);
        Ok(())
    }
}

/// A named list of nested reflective elements.
pub struct PropertyArray<T> {
    name: ObjectName,
    label: &'static str,
    access: Box<dyn ArrayAccess<T>>,
}

impl<T> PropertyArray<T> {
    #[inline]
    pub fn name(&self) -> ObjectName {
        self.name
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Ordered property and array registry for one type.
pub struct Schema<T> {
    class_name: &'static str,
    properties: Vec<Property<T>>,
    arrays: Vec<PropertyArray<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            properties: Vec::new(),
            arrays: Vec::new(),
        }
    }

    fn push_property(
        mut self,
        label: &'static str,
        kind: ValueKind,
        getter: Getter<T>,
        setter: Option<Setter<T>>,
    ) -> Self {
        let name = ObjectName::new(label);
        debug_assert!(
            !self.properties.iter().any(|p| p.name == name),
            "property '{}' registered twice on {}",
            label,
            self.class_name
        );
        self.properties.push(Property {
            name,
            label,
            kind,
            getter,
            setter,
        });
        self
    }

    /// Register a read-write property.
    pub fn property(
        self,
        label: &'static str,
        kind: ValueKind,
        getter: Getter<T>,
        setter: Setter<T>,
    ) -> Self {
        self.push_property(label, kind, getter, Some(setter))
    }

    /// Register a read-only property.
    pub fn readonly(self, label: &'static str, kind: ValueKind, getter: Getter<T>) -> Self {
        self.push_property(label, kind, getter, None)
    }

    /// Register a property array backed by a `Vec<E>` field.
    pub fn array<E: Reflect + Default>(
        mut self,
        label: &'static str,
        entries: fn(&T) -> &Vec<E>,
        entries_mut: fn(&mut T) -> &mut Vec<E>,
    ) -> Self {
        let name = ObjectName::new(label);
        debug_assert!(
            !self.arrays.iter().any(|a| a.name == name),
            "property array '{}' registered twice on {}",
            label,
            self.class_name
        );
        self.arrays.push(PropertyArray {
            name,
            label,
            access: Box::new(VecAccess {
                entries,
                entries_mut,
            }),
        });
        self
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    pub fn arrays(&self) -> &[PropertyArray<T>] {
        &self.arrays
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("class_name", &self.class_name)
            .field("properties", &self.properties.iter().map(|p| p.label).collect::<Vec<_>>())
            .field("arrays", &self.arrays.iter().map(|a| a.label).collect::<Vec<_>>())
            .finish()
    }
}

/// Static reflection data for a type.
///
/// ```ignore
/// impl Reflect for AudioFile {
///     fn schema() -> &'static Schema<Self> {
///         static SCHEMA: LazyLock<Schema<AudioFile>> = LazyLock::new(|| {
///             Schema::<AudioFile>::new("AudioFile").property(
///                 "FileName",
///                 ValueKind::ObjectName,
///                 |f| f.file_name.into(),
///                 |f, v| { f.file_name = v.as_object_name()?; Ok(()) },
///             )
///         });
///         &SCHEMA
///     }
/// }
/// ```
pub trait Reflect: Sized + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// Object-safe reflective interface.
///
/// Implemented for every [`Reflect`] type. The provided methods implement
/// name lookup and the XML and stream encodings on top of the indexed
/// accessors.
pub trait Serializable: Any {
    fn class_name(&self) -> &'static str;

    fn property_count(&self) -> usize;
    fn property_info(&self, index: usize) -> Option<PropertyInfo>;
    fn get_at(&self, index: usize) -> Result<Value>;
    fn set_at(&mut self, index: usize, value: &Value) -> Result<()>;

    fn array_count(&self) -> usize;
    fn array_name(&self, array: usize) -> Option<(ObjectName, &'static str)>;
    fn array_len(&self, array: usize) -> usize;
    fn array_element(&self, array: usize, index: usize) -> Option<&dyn Serializable>;
    fn array_element_mut(&mut self, array: usize, index: usize) -> Option<&mut dyn Serializable>;
    fn array_add(&mut self, array: usize) -> Result<&mut dyn Serializable>;
    fn array_remove(&mut self, array: usize, index: usize) -> Result<()>;
    fn array_swap(&mut self, array: usize, a: usize, b: usize) -> Result<()>;

    /// Index of a property by name (linear scan).
    fn property_index(&self, name: ObjectName) -> Option<usize> {
        (0..self.property_count()).find(|&i| self.property_info(i).is_some_and(|p| p.name == name))
    }

    /// Index of a property array by name.
    fn array_index(&self, name: ObjectName) -> Option<usize> {
        (0..self.array_count()).find(|&i| self.array_name(i).is_some_and(|(n, _)| n == name))
    }

    fn has(&self, name: ObjectName) -> bool {
        self.property_index(name).is_some()
    }

    fn get(&self, name: ObjectName) -> Result<Value> {
        let index = self
            .property_index(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_name_string()))?;
        self.get_at(index)
    }

    fn set(&mut self, name: ObjectName, value: &Value) -> Result<()> {
        let index = self
            .property_index(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_name_string()))?;
        self.set_at(index, value)
    }

    /// Apply attributes and child elements of `node`.
    ///
    /// Attributes that do not name a property are ignored, and properties
    /// without an attribute keep their current value. Array elements are
    /// appended.
    fn load_from_xml(&mut self, node: &XmlNode) -> Result<()> {
        for i in 0..self.property_count() {
            let Some(info) = self.property_info(i) else { continue };
            if info.read_only {
                continue;
            }
            if let Some(text) = node.attribute(info.label) {
                self.set_at(i, &Value::parse(info.kind, text))?;
            }
        }

        for a in 0..self.array_count() {
            let Some((_, label)) = self.array_name(a) else { continue };
            for child in node.children_named(label) {
                self.array_add(a)?.load_from_xml(child)?;
            }
        }
        Ok(())
    }

    /// Write writable properties as attributes and array elements as children.
    fn save_to_xml(&self, node: &mut XmlNode) -> Result<()> {
        for i in 0..self.property_count() {
            let Some(info) = self.property_info(i) else { continue };
            if info.read_only {
                continue;
            }
            node.set_attribute(info.label, self.get_at(i)?.to_string());
        }

        for a in 0..self.array_count() {
            let Some((_, label)) = self.array_name(a) else { continue };
            for e in 0..self.array_len(a) {
                if let Some(element) = self.array_element(a, e) {
                    let mut child = XmlNode::new(label);
                    element.save_to_xml(&mut child)?;
                    node.children.push(child);
                }
            }
        }
        Ok(())
    }

    fn load_from_stream(&mut self, r: &mut ByteReader<'_>) -> Result<()> {
        for i in 0..self.property_count() {
            let Some(info) = self.property_info(i) else { continue };
            if info.read_only {
                continue;
            }
            if Value::read(ValueKind::Bool, r)?.as_bool()? {
                let value = Value::read(info.kind, r)?;
                self.set_at(i, &value)?;
            }
        }

        for a in 0..self.array_count() {
            let count = Value::read(ValueKind::UInt, r)?.as_uint()?;
            for _ in 0..count {
                self.array_add(a)?.load_from_stream(r)?;
            }
        }
        Ok(())
    }

    /// Write every writable property flagged as present, then the arrays.
    fn save_to_stream(&self, w: &mut dyn Write) -> Result<()> {
        write_stream(self, None, w)
    }

    /// Copy every writable property from `source`.
    ///
    /// Both objects must expose the same property kinds in the same order.
    fn copy_from(&mut self, source: &dyn Serializable) -> Result<()> {
        let mine = property_kinds(self);
        let theirs = property_kinds(source);
        if mine != theirs {
            return Err(Error::SchemaMismatch {
                expected: format!("{} {:?}", self.class_name(), mine),
                actual: format!("{} {:?}", source.class_name(), theirs),
            });
        }

        for i in 0..self.property_count() {
            if self.property_info(i).is_some_and(|p| p.read_only) {
                continue;
            }
            let value = source.get_at(i)?;
            self.set_at(i, &value)?;
        }
        Ok(())
    }
}

impl<T: Reflect> Serializable for T {
    fn class_name(&self) -> &'static str {
        T::schema().class_name
    }

    fn property_count(&self) -> usize {
        T::schema().properties.len()
    }

    fn property_info(&self, index: usize) -> Option<PropertyInfo> {
        T::schema().properties.get(index).map(Property::info)
    }

    fn get_at(&self, index: usize) -> Result<Value> {
        let properties = &T::schema().properties;
        let property = properties.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: properties.len(),
        })?;
        Ok((property.getter)(self))
    }

    fn set_at(&mut self, index: usize, value: &Value) -> Result<()> {
        let properties = &T::schema().properties;
        let property = properties.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: properties.len(),
        })?;
        let setter = property
            .setter
            .ok_or_else(|| Error::ReadOnlyProperty(property.label.to_owned()))?;
        if value.kind() != property.kind {
            return Err(Error::TypeMismatch {
                expected: property.kind.name(),
                actual: value.kind().name(),
            });
        }
        setter(self, value)
    }

    fn array_count(&self) -> usize {
        T::schema().arrays.len()
    }

    fn array_name(&self, array: usize) -> Option<(ObjectName, &'static str)> {
        T::schema().arrays.get(array).map(|a| (a.name, a.label))
    }

    fn array_len(&self, array: usize) -> usize {
        T::schema()
            .arrays
            .get(array)
            .map_or(0, |a| a.access.len(self))
    }

    fn array_element(&self, array: usize, index: usize) -> Option<&dyn Serializable> {
        T::schema().arrays.get(array)?.access.element(self, index)
    }

    fn array_element_mut(&mut self, array: usize, index: usize) -> Option<&mut dyn Serializable> {
        T::schema().arrays.get(array)?.access.element_mut(self, index)
    }

    fn array_add(&mut self, array: usize) -> Result<&mut dyn Serializable> {
        let arrays = &T::schema().arrays;
        let entry = arrays.get(array).ok_or(Error::IndexOutOfBounds {
            index: array,
            count: arrays.len(),
        })?;
        Ok(entry.access.add(self))
    }

    fn array_remove(&mut self, array: usize, index: usize) -> Result<()> {
        let arrays = &T::schema().arrays;
        let entry = arrays.get(array).ok_or(Error::IndexOutOfBounds {
            index: array,
            count: arrays.len(),
        })?;
        entry.access.remove(self, index)
    }

    fn array_swap(&mut self, array: usize, a: usize, b: usize) -> Result<()> {
        let arrays = &T::schema().arrays;
        let entry = arrays.get(array).ok_or(Error::IndexOutOfBounds {
            index: array,
            count: arrays.len(),
        })?;
        entry.access.swap(self, a, b)
    }
}

fn property_kinds<S: Serializable + ?Sized>(s: &S) -> Vec<ValueKind> {
    (0..s.property_count())
        .filter_map(|i| s.property_info(i).map(|p| p.kind))
        .collect()
}

/// Stream encoding shared by `save_to_stream` and [`xml_to_stream`].
///
/// With a source node, a property is flagged present only when the node has
/// its attribute. Array elements map to the node's children in order, after
/// any elements the object already held.
fn write_stream<S: Serializable + ?Sized>(object: &S, node: Option<&XmlNode>, w: &mut dyn Write) -> Result<()> {
    for i in 0..object.property_count() {
        let Some(info) = object.property_info(i) else { continue };
        if info.read_only {
            continue;
        }
        let present = node.is_none_or(|n| n.attribute(info.label).is_some());
        w.write_u8(present as u8)?;
        if present {
            object.get_at(i)?.write(w)?;
        }
    }

    for a in 0..object.array_count() {
        let Some((_, label)) = object.array_name(a) else { continue };
        let children: Vec<&XmlNode> = node.map(|n| n.children_named(label).collect()).unwrap_or_default();
        let len = object.array_len(a);
        let first_from_node = len.saturating_sub(children.len());
        w.write_u32::<LittleEndian>(len as u32)?;
        for e in 0..len {
            let Some(element) = object.array_element(a, e) else { continue };
            // Elements that predate the XML have every property present.
            let child = e.checked_sub(first_from_node).and_then(|c| children.get(c).copied());
            write_stream(element, child, w)?;
        }
    }
    Ok(())
}

/// Convert an XML description straight to the stream form.
///
/// Writable properties without an attribute are written as absent, so a
/// reader keeps its own default for them.
pub fn xml_to_stream<T>(node: &XmlNode, w: &mut dyn Write) -> Result<()>
where
    T: Serializable + Default,
{
    let mut object = T::default();
    object.load_from_xml(node)?;
    write_stream(&object, Some(node), w)
}

/// Look up a property array by name, for callers that only know the label.
pub fn find_array(object: &dyn Serializable, name: &str) -> Result<usize> {
    object
        .array_index(ObjectName::new(name))
        .ok_or_else(|| Error::PropertyArrayNotFound(name.to_owned()))
}

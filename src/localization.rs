//! Localized string tables.
//!
//! A string set is stored per language as `Strings/<set>.<lang>.{xml,ge}`:
//!
//! ```xml
//! <Strings>
//!   <String id="Menu.Play" text="Play"/>
//! </Strings>
//! ```
//!
//! The packed form is a `Byte` count followed by `ObjectName` id and
//! `String` text pairs.

use std::collections::HashMap;
use std::io::Write;

use crate::content::Resource;
use crate::core::{Named, ObjectName, Value, ValueKind, XmlNode};
use crate::util::{ByteReader, Error, Result};

pub const STRINGS_SUBDIR: &str = "Strings";

/// One translated string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizedString {
    id: ObjectName,
    text: String,
}

impl LocalizedString {
    pub fn new(id: ObjectName, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Named for LocalizedString {
    fn name(&self) -> ObjectName {
        self.id
    }
}

impl Resource for LocalizedString {
    const TYPE_NAME: &'static str = "LocalizedString";

    fn group_name(&self) -> ObjectName {
        ObjectName::EMPTY
    }

    fn size_in_bytes(&self) -> usize {
        self.text.len()
    }
}

/// File name of a string set for one language: `<set>.<lang>`.
pub fn strings_file_name(set: &str, language: &str) -> String {
    format!("{}.{}", set, language)
}

pub fn read_strings_xml(node: &XmlNode) -> Result<Vec<LocalizedString>> {
    if node.name != "Strings" {
        return Err(Error::invalid(format!("expected <Strings>, found <{}>", node.name)));
    }
    node.children_named("String")
        .map(|s| {
            let id = ObjectName::new(s.required_attribute("id")?);
            Ok(LocalizedString::new(id, s.attribute("text").unwrap_or_default()))
        })
        .collect()
}

pub fn read_strings_packed(r: &mut ByteReader<'_>) -> Result<Vec<LocalizedString>> {
    let count = Value::read(ValueKind::Byte, r)?.as_byte()?;
    (0..count)
        .map(|_| {
            let id = Value::read(ValueKind::ObjectName, r)?.as_object_name()?;
            let text = Value::read(ValueKind::String, r)?;
            Ok(LocalizedString::new(id, text.as_str()?))
        })
        .collect()
}

pub fn write_strings_xml(strings: &[LocalizedString]) -> XmlNode {
    let mut root = XmlNode::new("Strings");
    for s in strings {
        root.add_child(
            XmlNode::new("String")
                .with_attribute("id", s.id.to_name_string())
                .with_attribute("text", s.text.clone()),
        );
    }
    root
}

pub fn write_strings_packed<W: Write + ?Sized>(strings: &[LocalizedString], w: &mut W) -> Result<()> {
    let count = u8::try_from(strings.len())
        .map_err(|_| Error::invalid("string set holds more than 255 strings"))?;
    Value::Byte(count).write(w)?;
    for s in strings {
        Value::ObjectName(s.id).write(w)?;
        Value::String(s.text.clone()).write(w)?;
    }
    Ok(())
}

/// Runtime values substituted into localized text as `$name`.
#[derive(Clone, Debug, Default)]
pub struct StringVariables {
    values: HashMap<ObjectName, String>,
}

impl StringVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: ObjectName, value: impl Into<String>) {
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: ObjectName) -> Option<&str> {
        self.values.get(&name).map(String::as_str)
    }

    /// Replace every `$identifier` whose variable is set.
    ///
    /// Identifiers are ASCII letters, digits and `_`. Unknown variables are
    /// left as written.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let len = after
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            match self.get(ObjectName::new(&after[..len])).filter(|_| len > 0) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(&after[..len]);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<LocalizedString> {
        vec![
            LocalizedString::new(ObjectName::new("Menu.Play"), "Play"),
            LocalizedString::new(ObjectName::new("Hud.Score"), "Score: $score"),
        ]
    }

    #[test]
    fn test_xml_round_trip() {
        let node = write_strings_xml(&table());
        let text = node.to_xml_string().unwrap();
        let back = read_strings_xml(&XmlNode::parse(&text).unwrap()).unwrap();
        assert_eq!(back, table());
    }

    #[test]
    fn test_packed_round_trip() {
        let mut buf = Vec::new();
        write_strings_packed(&table(), &mut buf).unwrap();
        let back = read_strings_packed(&mut ByteReader::new(&buf)).unwrap();
        assert_eq!(back, table());
    }

    #[test]
    fn test_missing_id_is_error() {
        let node = XmlNode::parse(r#"<Strings><String text="orphan"/></Strings>"#).unwrap();
        assert!(read_strings_xml(&node).is_err());
    }

    #[test]
    fn test_substitute() {
        let mut vars = StringVariables::new();
        vars.set(ObjectName::new("score"), "120");
        assert_eq!(vars.get(ObjectName::new("score")), Some("120"));
        assert_eq!(vars.substitute("Score: $score pts"), "Score: 120 pts");
        assert_eq!(vars.substitute("$lives left"), "$lives left");
        assert_eq!(vars.substitute("cost $ 5"), "cost $ 5");
    }
}

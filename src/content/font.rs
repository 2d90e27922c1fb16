//! Bitmap fonts.
//!
//! A [`Font`] owns one or more character sets sharing a single texture
//! atlas. Each set is described by an AngelCode `.fnt` XML file and is
//! placed in the atlas through its own UV offset and scale, so a bold and a
//! regular face can be packed side by side.
//!
//! Packed font data (one character set), [`Value`] stream encoding:
//!
//! ```text
//! UShort      texture width
//! UShort      texture height
//! Float       base
//! Float       line height
//! UShort      glyph count
//! per glyph:  Byte id, Short x, y, width, height, offsetX, offsetY, advanceX
//! UShort      kerning count
//! per pair:   Byte first, Byte second, Short amount
//! ```
//!
//! In packed data `offsetY` is already relative to the baseline.

use std::collections::HashMap;
use std::io::Write;
use std::sync::LazyLock;

use super::{ContentData, ContentKind, ContentSource, Resource};
use crate::core::{Named, ObjectName, Reflect, Schema, Serializable, Value, ValueKind, XmlNode};
use crate::util::{ByteReader, Error, Result, TextureCoordinates};

/// Metrics and atlas rectangle of one character.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    /// Distance from the baseline to the glyph top.
    pub offset_y: f32,
    pub advance_x: f32,
    pub uv: TextureCoordinates,
}

/// Placement of one character set inside the font atlas.
#[derive(Clone, Debug, PartialEq)]
pub struct FontCharacterSet {
    pub name: ObjectName,
    pub u_offset: f32,
    pub v_offset: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    pub line_height: f32,
}

impl Default for FontCharacterSet {
    fn default() -> Self {
        Self {
            name: ObjectName::EMPTY,
            u_offset: 0.0,
            v_offset: 0.0,
            u_scale: 1.0,
            v_scale: 1.0,
            line_height: 0.0,
        }
    }
}

impl FontCharacterSet {
    fn remap(&self, uv: TextureCoordinates) -> TextureCoordinates {
        TextureCoordinates {
            u0: self.u_offset + uv.u0 * self.u_scale,
            u1: self.u_offset + uv.u1 * self.u_scale,
            v0: self.v_offset + uv.v0 * self.v_scale,
            v1: self.v_offset + uv.v1 * self.v_scale,
        }
    }
}

impl Reflect for FontCharacterSet {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<FontCharacterSet>> = LazyLock::new(|| {
            Schema::<FontCharacterSet>::new("FontCharacterSet")
                .property("Name", ValueKind::ObjectName, |s| s.name.into(), |s, v| {
                    s.name = v.as_object_name()?;
                    Ok(())
                })
                .property("UOffset", ValueKind::Float, |s| s.u_offset.into(), |s, v| {
                    s.u_offset = v.as_float()?;
                    Ok(())
                })
                .property("VOffset", ValueKind::Float, |s| s.v_offset.into(), |s, v| {
                    s.v_offset = v.as_float()?;
                    Ok(())
                })
                .property("UScale", ValueKind::Float, |s| s.u_scale.into(), |s, v| {
                    s.u_scale = v.as_float()?;
                    Ok(())
                })
                .property("VScale", ValueKind::Float, |s| s.v_scale.into(), |s, v| {
                    s.v_scale = v.as_float()?;
                    Ok(())
                })
                .property("LineHeight", ValueKind::Float, |s| s.line_height.into(), |s, v| {
                    s.line_height = v.as_float()?;
                    Ok(())
                })
        });
        &SCHEMA
    }
}

/// One character as described by the font tool, in atlas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontChar {
    pub id: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance_x: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KerningPair {
    pub first: u8,
    pub second: u8,
    pub amount: i16,
}

/// Pixel-space description of a single character set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontData {
    pub texture_width: f32,
    pub texture_height: f32,
    pub base: f32,
    pub line_height: f32,
    pub chars: Vec<FontChar>,
    pub kernings: Vec<KerningPair>,
}

impl FontData {
    /// Parse an AngelCode XML descriptor (`<font><common/><chars/><kernings/></font>`).
    pub fn from_fnt(node: &XmlNode) -> Result<Self> {
        if node.name != "font" {
            return Err(Error::invalid(format!("expected <font>, found <{}>", node.name)));
        }
        let common = node
            .child("common")
            .ok_or_else(|| Error::invalid("font descriptor has no <common> element"))?;

        let mut data = Self {
            texture_width: float_attr(common, "scaleW"),
            texture_height: float_attr(common, "scaleH"),
            base: float_attr(common, "base"),
            line_height: float_attr(common, "lineHeight"),
            ..Default::default()
        };
        if data.texture_width <= 0.0 || data.texture_height <= 0.0 {
            return Err(Error::invalid("font texture size must be positive"));
        }

        if let Some(chars) = node.child("chars") {
            for c in chars.children_named("char") {
                data.chars.push(FontChar {
                    id: byte_attr(c, "id"),
                    x: float_attr(c, "x"),
                    y: float_attr(c, "y"),
                    width: float_attr(c, "width"),
                    height: float_attr(c, "height"),
                    offset_x: float_attr(c, "xoffset"),
                    offset_y: data.base - float_attr(c, "yoffset"),
                    advance_x: float_attr(c, "xadvance"),
                });
            }
        }

        if let Some(kernings) = node.child("kernings") {
            for k in kernings.children_named("kerning") {
                let amount = k
                    .attribute("amount")
                    .map_or(0, |s| Value::parse(ValueKind::Int, s).as_int().unwrap_or(0));
                data.kernings.push(KerningPair {
                    first: byte_attr(k, "first"),
                    second: byte_attr(k, "second"),
                    amount: amount.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
                });
            }
        }
        Ok(data)
    }

    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let mut data = Self {
            texture_width: read_ushort(r)? as f32,
            texture_height: read_ushort(r)? as f32,
            base: Value::read(ValueKind::Float, r)?.as_float()?,
            line_height: Value::read(ValueKind::Float, r)?.as_float()?,
            ..Default::default()
        };

        let char_count = read_ushort(r)?;
        data.chars.reserve(char_count as usize);
        for _ in 0..char_count {
            data.chars.push(FontChar {
                id: Value::read(ValueKind::Byte, r)?.as_byte()?,
                x: read_short(r)?,
                y: read_short(r)?,
                width: read_short(r)?,
                height: read_short(r)?,
                offset_x: read_short(r)?,
                offset_y: read_short(r)?,
                advance_x: read_short(r)?,
            });
        }

        let kerning_count = read_ushort(r)?;
        for _ in 0..kerning_count {
            data.kernings.push(KerningPair {
                first: Value::read(ValueKind::Byte, r)?.as_byte()?,
                second: Value::read(ValueKind::Byte, r)?.as_byte()?,
                amount: Value::read(ValueKind::Short, r)?.as_short()?,
            });
        }
        Ok(data)
    }

    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        Value::UShort(self.texture_width as u16).write(w)?;
        Value::UShort(self.texture_height as u16).write(w)?;
        Value::Float(self.base).write(w)?;
        Value::Float(self.line_height).write(w)?;

        Value::UShort(count_u16(self.chars.len(), "glyphs")?).write(w)?;
        for c in &self.chars {
            Value::Byte(c.id).write(w)?;
            for v in [c.x, c.y, c.width, c.height, c.offset_x, c.offset_y, c.advance_x] {
                Value::Short(v.round() as i16).write(w)?;
            }
        }

        Value::UShort(count_u16(self.kernings.len(), "kerning pairs")?).write(w)?;
        for k in &self.kernings {
            Value::Byte(k.first).write(w)?;
            Value::Byte(k.second).write(w)?;
            Value::Short(k.amount).write(w)?;
        }
        Ok(())
    }
}

fn float_attr(node: &XmlNode, name: &str) -> f32 {
    node.attribute(name)
        .map_or(0.0, |s| Value::parse(ValueKind::Float, s).as_float().unwrap_or(0.0))
}

fn byte_attr(node: &XmlNode, name: &str) -> u8 {
    node.attribute(name)
        .map_or(0, |s| Value::parse(ValueKind::UInt, s).as_uint().unwrap_or(0) as u8)
}

fn read_ushort(r: &mut ByteReader<'_>) -> Result<u16> {
    Value::read(ValueKind::UShort, r)?.as_ushort()
}

fn read_short(r: &mut ByteReader<'_>) -> Result<f32> {
    Ok(Value::read(ValueKind::Short, r)?.as_short()? as f32)
}

fn count_u16(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::invalid(format!("too many {} for packed font data", what)))
}

/// Receives the decoded atlas image of a font.
///
/// Closures taking `(font name, image bytes)` implement this.
pub trait FontTextureSink {
    fn create_font_texture(&mut self, font: ObjectName, image: &[u8]) -> Result<()>;
}

impl<F> FontTextureSink for F
where
    F: FnMut(ObjectName, &[u8]) -> Result<()>,
{
    fn create_font_texture(&mut self, font: ObjectName, image: &[u8]) -> Result<()> {
        self(font, image)
    }
}

/// A bitmap font with per-character-set glyph and kerning tables.
#[derive(Clone, Debug, Default)]
pub struct Font {
    name: ObjectName,
    group: ObjectName,
    character_sets: Vec<FontCharacterSet>,
    glyphs: Vec<HashMap<u8, Glyph>>,
    kernings: Vec<HashMap<(u8, u8), i16>>,
    offset_y_min: f32,
    offset_y_max: f32,
    texture_len: usize,
}

impl Font {
    pub const SUBDIR: &'static str = "Fonts";
    pub const DESCRIPTOR_EXTENSION: &'static str = "fnt";
    pub const TEXTURE_EXTENSION: &'static str = "png";

    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            ..Default::default()
        }
    }

    /// Descriptor file name of a character set: `<font>` or `<font>_<set>`.
    pub fn descriptor_name(&self, set: &FontCharacterSet) -> String {
        let font = self.name.to_name_string();
        if set.name.is_empty() {
            font
        } else {
            format!("{}_{}", font, set.name.to_name_string())
        }
    }

    /// Read `.fnt` descriptors and the atlas from `Fonts/<group>/`.
    ///
    /// A font without character sets gets one default set first. Returns the
    /// atlas image; creating its texture is left to the caller.
    pub fn load(&mut self, source: &dyn ContentSource) -> Result<ContentData> {
        let _span = tracing::debug_span!("load_font", font = %self.name).entered();
        if self.character_sets.is_empty() {
            self.character_sets.push(FontCharacterSet::default());
        }
        let subdir = format!("{}/{}", Self::SUBDIR, self.group.to_name_string());

        let mut sets = Vec::with_capacity(self.character_sets.len());
        for set in &self.character_sets {
            let file = self.descriptor_name(set);
            let bytes = source.read(ContentKind::FontData, &subdir, &file, Self::DESCRIPTOR_EXTENSION)?;
            sets.push(FontData::from_fnt(&XmlNode::parse_bytes(&bytes)?)?);
        }

        let image = source.read(
            ContentKind::FontTexture,
            &subdir,
            &self.name.to_name_string(),
            Self::TEXTURE_EXTENSION,
        )?;
        self.apply_all(&sets);
        self.texture_len = image.len();
        Ok(image)
    }

    /// Read packed font data for the first character set. Returns the
    /// embedded atlas image.
    pub fn load_packed_data<'a>(&mut self, r: &mut ByteReader<'a>) -> Result<&'a [u8]> {
        if self.character_sets.is_empty() {
            self.character_sets.push(FontCharacterSet::default());
        }
        let data = FontData::read(r)?;
        let texture_len = Value::read(ValueKind::UInt, r)?.as_uint()? as usize;
        let image = r.read_bytes(texture_len)?;

        self.apply_all(std::slice::from_ref(&data));
        self.texture_len = texture_len;
        Ok(image)
    }

    /// Decode one packed font: reflected properties, font data, atlas.
    pub fn read_packed<'a>(
        name: ObjectName,
        group: ObjectName,
        r: &mut ByteReader<'a>,
    ) -> Result<(Self, &'a [u8])> {
        let mut font = Self::new(name, group);
        font.load_from_stream(r)?;
        let image = font.load_packed_data(r)?;
        Ok((font, image))
    }

    /// Encode one packed font with the given font data and atlas image.
    pub fn write_packed<W: Write>(&self, w: &mut W, data: &FontData, image: &[u8]) -> Result<()> {
        self.save_to_stream(w)?;
        data.write(w)?;
        Value::UInt(image.len() as u32).write(w)?;
        w.write_all(image)?;
        Ok(())
    }

    fn apply_all(&mut self, sets: &[FontData]) {
        self.glyphs = vec![HashMap::new(); sets.len()];
        self.kernings = vec![HashMap::new(); sets.len()];
        self.offset_y_min = f32::INFINITY;
        self.offset_y_max = f32::NEG_INFINITY;
        for (index, data) in sets.iter().enumerate() {
            self.apply(index, data);
        }
        if self.offset_y_min > self.offset_y_max {
            self.offset_y_min = 0.0;
            self.offset_y_max = 0.0;
        }
        tracing::debug!(
            font = %self.name,
            sets = sets.len(),
            glyphs = self.glyphs.iter().map(HashMap::len).sum::<usize>(),
            "font tables built"
        );
    }

    fn apply(&mut self, index: usize, data: &FontData) {
        let set = &mut self.character_sets[index];
        set.line_height = data.line_height;
        let set = set.clone();

        let glyphs = &mut self.glyphs[index];
        for c in &data.chars {
            let u0 = c.x / data.texture_width;
            let v0 = c.y / data.texture_height;
            let uv = TextureCoordinates {
                u0,
                u1: u0 + c.width / data.texture_width,
                v0,
                v1: v0 + c.height / data.texture_height,
            };
            self.offset_y_min = self.offset_y_min.min(c.offset_y);
            self.offset_y_max = self.offset_y_max.max(c.offset_y);
            glyphs.insert(
                c.id,
                Glyph {
                    width: c.width,
                    height: c.height,
                    offset_x: c.offset_x,
                    offset_y: c.offset_y,
                    advance_x: c.advance_x,
                    uv: set.remap(uv),
                },
            );
        }

        let kernings = &mut self.kernings[index];
        for k in &data.kernings {
            kernings.insert((k.first, k.second), k.amount);
        }
    }

    pub fn character_sets(&self) -> &[FontCharacterSet] {
        &self.character_sets
    }

    pub fn add_character_set(&mut self, set: FontCharacterSet) {
        self.character_sets.push(set);
    }

    /// Index of a character set by name; unknown names map to the first set.
    pub fn character_set_index(&self, name: ObjectName) -> usize {
        self.character_sets
            .iter()
            .position(|s| s.name == name)
            .unwrap_or(0)
    }

    pub fn line_height(&self, set: usize) -> Option<f32> {
        self.character_sets.get(set).map(|s| s.line_height)
    }

    pub fn glyph(&self, set: usize, character: u8) -> Option<&Glyph> {
        self.glyphs.get(set)?.get(&character)
    }

    pub fn glyph_count(&self, set: usize) -> usize {
        self.glyphs.get(set).map_or(0, HashMap::len)
    }

    /// Horizontal adjustment between two characters; 0.0 when no pair is defined.
    pub fn kerning(&self, set: usize, first: u8, second: u8) -> f32 {
        self.kernings
            .get(set)
            .and_then(|k| k.get(&(first, second)))
            .map_or(0.0, |&amount| amount as f32)
    }

    pub fn offset_y_min(&self) -> f32 {
        self.offset_y_min
    }

    pub fn offset_y_max(&self) -> f32 {
        self.offset_y_max
    }
}

impl Named for Font {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for Font {
    const TYPE_NAME: &'static str = "Font";

    fn group_name(&self) -> ObjectName {
        self.group
    }

    fn size_in_bytes(&self) -> usize {
        self.texture_len + self.glyphs.iter().map(|g| g.len() * std::mem::size_of::<Glyph>()).sum::<usize>()
    }
}

impl Reflect for Font {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Font>> = LazyLock::new(|| {
            Schema::<Font>::new("Font").array::<FontCharacterSet>(
                "FontCharacterSet",
                |f| &f.character_sets,
                |f| &mut f.character_sets,
            )
        });
        &SCHEMA
    }
}

/// Encode a packed font list: a `Byte` count, the font names, then each
/// font as written by [`Font::write_packed`] preceded by its name.
pub fn write_font_list_packed<W: Write>(fonts: &[(&Font, &FontData, &[u8])], w: &mut W) -> Result<()> {
    let count = u8::try_from(fonts.len()).map_err(|_| Error::invalid("font list holds more than 255 fonts"))?;
    Value::Byte(count).write(w)?;
    for (font, _, _) in fonts {
        Value::ObjectName(font.name).write(w)?;
    }
    for (font, data, image) in fonts {
        Value::ObjectName(font.name).write(w)?;
        font.write_packed(w, data, image)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;

    const FNT: &str = r#"<?xml version="1.0"?>
<font>
  <info face="Sans" size="32"/>
  <common lineHeight="36" base="28" scaleW="256" scaleH="128"/>
  <chars count="2">
    <char id="65" x="0" y="0" width="20" height="24" xoffset="1" yoffset="4" xadvance="21"/>
    <char id="86" x="32" y="64" width="18" height="24" xoffset="0" yoffset="30" xadvance="19"/>
  </chars>
  <kernings count="1">
    <kerning first="65" second="86" amount="-2"/>
  </kernings>
</font>"#;

    #[test]
    fn test_fnt_glyph_metrics() {
        let data = FontData::from_fnt(&XmlNode::parse(FNT).unwrap()).unwrap();
        assert_eq!(data.chars.len(), 2);
        assert_eq!(data.chars[0].offset_y, 24.0);
        assert_eq!(data.chars[1].offset_y, -2.0);
        assert_eq!(data.kernings[0], KerningPair { first: 65, second: 86, amount: -2 });
    }

    #[test]
    fn test_load_remaps_uv_through_character_set() {
        let source = MemoryContentSource::new();
        source.insert("Fonts/ui", "Title_bold", "fnt", FNT);
        source.insert("Fonts/ui", "Title", "png", vec![1u8, 2, 3]);

        let mut font = Font::new(ObjectName::new("Title"), ObjectName::new("ui"));
        font.add_character_set(FontCharacterSet {
            name: ObjectName::new("bold"),
            u_offset: 0.5,
            u_scale: 0.5,
            ..Default::default()
        });

        let image = font.load(&source).unwrap();
        assert_eq!(&*image, &[1u8, 2, 3]);

        let v = font.glyph(0, b'V').unwrap();
        assert_eq!(v.uv.u0, 0.5 + 0.125 * 0.5);
        assert_eq!(v.uv.v0, 0.5);
        assert_eq!(v.uv.v1, 0.5 + 24.0 / 128.0);
        assert_eq!(font.line_height(0), Some(36.0));
        assert_eq!(font.offset_y_min(), -2.0);
        assert_eq!(font.offset_y_max(), 24.0);
        assert_eq!(font.character_set_index(ObjectName::new("bold")), 0);
    }

    #[test]
    fn test_kerning_defaults_to_zero() {
        let source = MemoryContentSource::new();
        source.insert("Fonts/ui", "Body", "fnt", FNT);
        source.insert("Fonts/ui", "Body", "png", vec![0u8]);
        let mut font = Font::new(ObjectName::new("Body"), ObjectName::new("ui"));
        font.load(&source).unwrap();

        assert_eq!(font.kerning(0, b'A', b'V'), -2.0);
        assert_eq!(font.kerning(0, b'V', b'A'), 0.0);
        assert_eq!(font.kerning(3, b'A', b'V'), 0.0);
        assert!(font.glyph(0, b'Z').is_none());
    }

    #[test]
    fn test_packed_round_trip() {
        let data = FontData::from_fnt(&XmlNode::parse(FNT).unwrap()).unwrap();
        let mut font = Font::new(ObjectName::new("Body"), ObjectName::new("ui"));
        font.add_character_set(FontCharacterSet::default());

        let mut buf = Vec::new();
        font.write_packed(&mut buf, &data, &[9, 8, 7, 6]).unwrap();

        let mut r = ByteReader::new(&buf);
        let (back, image) = Font::read_packed(ObjectName::new("Body"), ObjectName::new("ui"), &mut r).unwrap();
        assert!(r.is_at_end());
        assert_eq!(image, &[9u8, 8, 7, 6]);
        assert_eq!(back.character_sets().len(), 1);
        assert_eq!(back.glyph_count(0), 2);
        assert_eq!(back.glyph(0, b'A').unwrap().offset_y, 24.0);
        assert_eq!(back.kerning(0, b'A', b'V'), -2.0);
        assert_eq!(back.line_height(0), Some(36.0));
    }

    #[test]
    fn test_missing_common_is_format_error() {
        let node = XmlNode::parse("<font><chars/></font>").unwrap();
        assert!(FontData::from_fnt(&node).is_err());
    }
}

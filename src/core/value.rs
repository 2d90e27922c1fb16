//! Tagged property values.
//!
//! [`Value`] is the single typed payload that flows through the property
//! system. It has two encodings:
//!
//! - **Text**, used for XML attributes: integers in decimal, vectors as
//!   `x:1 y:2 z:3`, colors as `r:1 g:1 b:1 a:1`, booleans as `true`/`false`.
//! - **Stream**, used for packed binary content: numeric kinds are written
//!   little-endian at their native width, strings and names as a length byte
//!   followed by every byte offset by 128.
//!
//! Neither encoding is self-describing; the reader always supplies the kind.

use std::fmt;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use smallvec::SmallVec;

use super::ObjectName;
use crate::util::{ByteReader, Color, Error, Result, Vec2, Vec3};

/// Offset applied to every string byte in the stream encoding.
const STRING_BYTE_OFFSET: u8 = 128;

/// Longest string the one-byte length prefix can describe.
pub const MAX_STREAM_STRING_LEN: usize = u8::MAX as usize;

/// Kind of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    UInt,
    Float,
    Bool,
    Byte,
    Short,
    UShort,
    String,
    ObjectName,
    Vector2,
    Vector3,
    Color,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 12] = [
        ValueKind::Int,
        ValueKind::UInt,
        ValueKind::Float,
        ValueKind::Bool,
        ValueKind::Byte,
        ValueKind::Short,
        ValueKind::UShort,
        ValueKind::String,
        ValueKind::ObjectName,
        ValueKind::Vector2,
        ValueKind::Vector3,
        ValueKind::Color,
    ];

    /// Name used in XML descriptors.
    pub const fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "Int",
            ValueKind::UInt => "UInt",
            ValueKind::Float => "Float",
            ValueKind::Bool => "Bool",
            ValueKind::Byte => "Byte",
            ValueKind::Short => "Short",
            ValueKind::UShort => "UShort",
            ValueKind::String => "String",
            ValueKind::ObjectName => "ObjectName",
            ValueKind::Vector2 => "Vector2",
            ValueKind::Vector3 => "Vector3",
            ValueKind::Color => "Color",
        }
    }

    /// Look up a kind by its descriptor name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| Error::UnknownValueKind(name.to_owned()))
    }

    /// Stream width for fixed-size kinds, `None` for strings and names.
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            ValueKind::Int | ValueKind::UInt | ValueKind::Float => Some(4),
            ValueKind::Bool | ValueKind::Byte => Some(1),
            ValueKind::Short | ValueKind::UShort => Some(2),
            ValueKind::String | ValueKind::ObjectName => None,
            ValueKind::Vector2 => Some(8),
            ValueKind::Vector3 => Some(12),
            ValueKind::Color => Some(16),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed property value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i32),
    UInt(u32),
    Float(f32),
    Bool(bool),
    Byte(u8),
    Short(i16),
    UShort(u16),
    String(String),
    ObjectName(ObjectName),
    Vector2(Vec2),
    Vector3(Vec3),
    Color(Color),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Short(_) => ValueKind::Short,
            Value::UShort(_) => ValueKind::UShort,
            Value::String(_) => ValueKind::String,
            Value::ObjectName(_) => ValueKind::ObjectName,
            Value::Vector2(_) => ValueKind::Vector2,
            Value::Vector3(_) => ValueKind::Vector3,
            Value::Color(_) => ValueKind::Color,
        }
    }

    /// Default value of a kind: zero numbers, empty strings, white for colors.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Value::Int(0),
            ValueKind::UInt => Value::UInt(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Byte => Value::Byte(0),
            ValueKind::Short => Value::Short(0),
            ValueKind::UShort => Value::UShort(0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::ObjectName => Value::ObjectName(ObjectName::EMPTY),
            ValueKind::Vector2 => Value::Vector2(Vec2::ZERO),
            ValueKind::Vector3 => Value::Vector3(Vec3::ZERO),
            ValueKind::Color => Value::Color(Color::default()),
        }
    }

    /// Parse text for the given kind.
    ///
    /// Parsing is lenient in the way C scanners are: unparsable numbers become
    /// zero and vector components missing from the text keep their default.
    pub fn parse(kind: ValueKind, text: &str) -> Self {
        match kind {
            ValueKind::Int => Value::Int(scan_int(text) as i32),
            ValueKind::UInt => Value::UInt(scan_int(text) as u32),
            ValueKind::Float => Value::Float(Scanner::new(text).float().unwrap_or(0.0)),
            ValueKind::Bool => Value::Bool(text == "true"),
            ValueKind::Byte => Value::Byte(scan_int(text) as u8),
            ValueKind::Short => Value::Short(scan_int(text) as i16),
            ValueKind::UShort => Value::UShort(scan_int(text) as u16),
            ValueKind::String => Value::String(text.to_owned()),
            ValueKind::ObjectName => Value::ObjectName(ObjectName::new(text)),
            ValueKind::Vector2 => {
                let mut c = [0.0f32; 2];
                scan_labeled(text, &["x:", "y:"], &mut c);
                Value::Vector2(Vec2::from_array(c))
            }
            ValueKind::Vector3 => {
                let mut c = [0.0f32; 3];
                scan_labeled(text, &["x:", "y:", "z:"], &mut c);
                Value::Vector3(Vec3::from_array(c))
            }
            ValueKind::Color => {
                let mut c = Color::default().to_array();
                scan_labeled(text, &["r:", "g:", "b:", "a:"], &mut c);
                Value::Color(Color::new(c[0], c[1], c[2], c[3]))
            }
        }
    }

    /// Type-significant length in bytes (string length for strings and names).
    pub fn size(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::ObjectName(n) => n.to_name_string().len(),
            other => other.kind().fixed_size().unwrap_or(0),
        }
    }

    /// Significant raw bytes, little-endian for numeric kinds.
    pub fn raw_bytes(&self) -> SmallVec<[u8; 16]> {
        let mut out = SmallVec::new();
        match self {
            Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UInt(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => out.push(*v as u8),
            Value::Byte(v) => out.push(*v),
            Value::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::UShort(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::String(s) => out.extend_from_slice(s.as_bytes()),
            Value::ObjectName(n) => out.extend_from_slice(n.to_name_string().as_bytes()),
            Value::Vector2(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Value::Vector3(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Value::Color(c) => out.extend_from_slice(bytemuck::bytes_of(c)),
        }
        out
    }

    /// Rebuild a value from its raw bytes.
    pub fn from_raw(kind: ValueKind, bytes: &[u8]) -> Result<Self> {
        if let Some(size) = kind.fixed_size() {
            if bytes.len() < size {
                return Err(Error::UnexpectedEof {
                    offset: 0,
                    needed: size,
                    available: bytes.len(),
                });
            }
        }
        let mut r = ByteReader::new(bytes);
        match kind {
            ValueKind::String => Ok(Value::String(String::from_utf8(bytes.to_vec())?)),
            ValueKind::ObjectName => {
                let s = String::from_utf8(bytes.to_vec())?;
                Ok(Value::ObjectName(ObjectName::new(&s)))
            }
            _ => read_fixed(kind, &mut r),
        }
    }

    /// Read a value of `kind` from the stream encoding.
    pub fn read(kind: ValueKind, r: &mut ByteReader<'_>) -> Result<Self> {
        match kind {
            ValueKind::String => Ok(Value::String(read_stream_string(r)?)),
            ValueKind::ObjectName => Ok(Value::ObjectName(ObjectName::new(&read_stream_string(r)?))),
            _ => read_fixed(kind, r),
        }
    }

    /// Write the stream encoding.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        match self {
            Value::Int(v) => w.write_i32::<LittleEndian>(*v)?,
            Value::UInt(v) => w.write_u32::<LittleEndian>(*v)?,
            Value::Float(v) => w.write_f32::<LittleEndian>(*v)?,
            Value::Bool(v) => w.write_u8(*v as u8)?,
            Value::Byte(v) => w.write_u8(*v)?,
            Value::Short(v) => w.write_i16::<LittleEndian>(*v)?,
            Value::UShort(v) => w.write_u16::<LittleEndian>(*v)?,
            Value::String(s) => write_stream_string(w, s)?,
            Value::ObjectName(n) => write_stream_string(w, &n.to_name_string())?,
            Value::Vector2(v) => {
                for c in v.to_array() {
                    w.write_f32::<LittleEndian>(c)?;
                }
            }
            Value::Vector3(v) => {
                for c in v.to_array() {
                    w.write_f32::<LittleEndian>(c)?;
                }
            }
            Value::Color(c) => {
                for ch in c.to_array() {
                    w.write_f32::<LittleEndian>(ch)?;
                }
            }
        }
        Ok(())
    }

    fn mismatch(&self, expected: ValueKind) -> Error {
        Error::TypeMismatch {
            expected: expected.name(),
            actual: self.kind().name(),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_uint(&self) -> Result<u32> {
        match self {
            Value::UInt(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::UInt)),
        }
    }

    pub fn as_float(&self) -> Result<f32> {
        match self {
            Value::Float(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_byte(&self) -> Result<u8> {
        match self {
            Value::Byte(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Byte)),
        }
    }

    pub fn as_short(&self) -> Result<i16> {
        match self {
            Value::Short(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Short)),
        }
    }

    pub fn as_ushort(&self) -> Result<u16> {
        match self {
            Value::UShort(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::UShort)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    pub fn as_object_name(&self) -> Result<ObjectName> {
        match self {
            Value::ObjectName(n) => Ok(*n),
            _ => Err(self.mismatch(ValueKind::ObjectName)),
        }
    }

    pub fn as_vector2(&self) -> Result<Vec2> {
        match self {
            Value::Vector2(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Vector2)),
        }
    }

    pub fn as_vector3(&self) -> Result<Vec3> {
        match self {
            Value::Vector3(v) => Ok(*v),
            _ => Err(self.mismatch(ValueKind::Vector3)),
        }
    }

    pub fn as_color(&self) -> Result<Color> {
        match self {
            Value::Color(c) => Ok(*c),
            _ => Err(self.mismatch(ValueKind::Color)),
        }
    }
}

/// Equality over the significant bytes: floats compare bitwise, names by hash.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::ObjectName(a), Value::ObjectName(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.kind() == other.kind() && self.raw_bytes() == other.raw_bytes(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::UShort(v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
            Value::ObjectName(n) => write!(f, "{}", n),
            Value::Vector2(v) => write!(f, "x:{} y:{}", v.x, v.y),
            Value::Vector3(v) => write!(f, "x:{} y:{} z:{}", v.x, v.y, v.z),
            Value::Color(c) => write!(f, "r:{} g:{} b:{} a:{}", c.red, c.green, c.blue, c.alpha),
        }
    }
}

macro_rules! impl_value_conversions {
    ($($ty:ty => $variant:ident, $getter:ident;)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<&Value> for $ty {
                type Error = Error;

                fn try_from(v: &Value) -> Result<Self> {
                    v.$getter()
                }
            }
        )*
    };
}

impl_value_conversions! {
    i32 => Int, as_int;
    u32 => UInt, as_uint;
    f32 => Float, as_float;
    bool => Bool, as_bool;
    u8 => Byte, as_byte;
    i16 => Short, as_short;
    u16 => UShort, as_ushort;
    ObjectName => ObjectName, as_object_name;
    Vec2 => Vector2, as_vector2;
    Vec3 => Vector3, as_vector3;
    Color => Color, as_color;
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl TryFrom<&Value> for String {
    type Error = Error;

    fn try_from(v: &Value) -> Result<Self> {
        v.as_str().map(str::to_owned)
    }
}

// ============================================================================
// Stream helpers
// ============================================================================

fn read_fixed(kind: ValueKind, r: &mut ByteReader<'_>) -> Result<Value> {
    Ok(match kind {
        ValueKind::Int => Value::Int(r.read_i32()?),
        ValueKind::UInt => Value::UInt(r.read_u32()?),
        ValueKind::Float => Value::Float(r.read_f32()?),
        ValueKind::Bool => Value::Bool(r.read_u8()? != 0),
        ValueKind::Byte => Value::Byte(r.read_u8()?),
        ValueKind::Short => Value::Short(r.read_i16()?),
        ValueKind::UShort => Value::UShort(r.read_u16()?),
        ValueKind::Vector2 => Value::Vector2(Vec2::new(r.read_f32()?, r.read_f32()?)),
        ValueKind::Vector3 => {
            Value::Vector3(Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
        }
        ValueKind::Color => Value::Color(Color::new(
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
        )),
        ValueKind::String | ValueKind::ObjectName => {
            return Err(Error::invalid(format!("{} has no fixed width", kind)));
        }
    })
}

fn read_stream_string(r: &mut ByteReader<'_>) -> Result<String> {
    let len = r.read_u8()? as usize;
    let bytes: Vec<u8> = r
        .read_bytes(len)?
        .iter()
        .map(|b| b.wrapping_add(STRING_BYTE_OFFSET))
        .collect();
    Ok(String::from_utf8(bytes)?)
}

fn write_stream_string<W: Write + ?Sized>(w: &mut W, s: &str) -> Result<()> {
    if s.len() > MAX_STREAM_STRING_LEN {
        return Err(Error::StringTooLong(s.len()));
    }
    w.write_u8(s.len() as u8)?;
    let encoded: SmallVec<[u8; 64]> = s
        .bytes()
        .map(|b| b.wrapping_add(STRING_BYTE_OFFSET))
        .collect();
    w.write_all(&encoded)?;
    Ok(())
}

// ============================================================================
// Text helpers
// ============================================================================

/// `atoi`-style scan: optional whitespace and sign, then leading digits.
fn scan_int(text: &str) -> i64 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Scan `label value` pairs in order, stopping at the first mismatch.
fn scan_labeled(text: &str, labels: &[&str], out: &mut [f32]) {
    let mut scanner = Scanner::new(text);
    for (label, slot) in labels.iter().zip(out.iter_mut()) {
        if !scanner.tag(label) {
            return;
        }
        match scanner.float() {
            Some(v) => *slot = v,
            None => return,
        }
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn tag(&mut self, tag: &str) -> bool {
        match self.rest.trim_start().strip_prefix(tag) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn float(&mut self) -> Option<f32> {
        let s = self.rest.trim_start();
        let len = float_prefix_len(s);
        if len == 0 {
            return None;
        }
        let value = s[..len].parse::<f32>().ok()?;
        self.rest = &s[len..];
        Some(value)
    }
}

/// Length of the longest prefix of `s` that reads as a float literal.
fn float_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    for special in ["inf", "nan"] {
        let end = i + special.len();
        if b.len() >= end && b[i..end].eq_ignore_ascii_case(special.as_bytes()) {
            return i + special.len();
        }
    }

    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return 0;
    }

    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Value> {
        vec![
            Value::Int(-42),
            Value::UInt(4_000_000_000),
            Value::Float(0.1),
            Value::Float(-1234.5678),
            Value::Bool(true),
            Value::Bool(false),
            Value::Byte(200),
            Value::Short(-300),
            Value::UShort(65000),
            Value::String("Hello world".into()),
            Value::String(String::new()),
            Value::ObjectName(ObjectName::new("MainMenu")),
            Value::Vector2(Vec2::new(0.5, -2.25)),
            Value::Vector3(Vec3::new(1.0, 2.5, -3.75)),
            Value::Color(Color::new(0.2, 0.4, 0.6, 0.8)),
        ]
    }

    #[test]
    fn test_stream_round_trip() {
        for value in samples() {
            let mut buf = Vec::new();
            value.write(&mut buf).unwrap();
            let mut r = ByteReader::new(&buf);
            let back = Value::read(value.kind(), &mut r).unwrap();
            assert_eq!(back, value, "kind {}", value.kind());
            assert!(r.is_at_end());
        }
    }

    #[test]
    fn test_text_round_trip() {
        for value in samples() {
            let text = value.to_string();
            let back = Value::parse(value.kind(), &text);
            assert_eq!(back.to_string(), text);
            assert_eq!(back, value, "text {:?}", text);
        }
    }

    #[test]
    fn test_text_grammar() {
        assert_eq!(Value::Vector3(Vec3::new(1.0, 2.5, 3.0)).to_string(), "x:1 y:2.5 z:3");
        assert_eq!(
            Value::parse(ValueKind::Vector3, "x:1.000 y:2.500 z:-3.000"),
            Value::Vector3(Vec3::new(1.0, 2.5, -3.0))
        );
        assert_eq!(
            Value::parse(ValueKind::Color, "r:0.5 g:0.25 b:1.0 a:0.0"),
            Value::Color(Color::new(0.5, 0.25, 1.0, 0.0))
        );
        assert_eq!(Value::parse(ValueKind::Vector2, "x:3e2 y:-1.5"), Value::Vector2(Vec2::new(300.0, -1.5)));
    }

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(Value::parse(ValueKind::Int, "  12abc"), Value::Int(12));
        assert_eq!(Value::parse(ValueKind::Int, "abc"), Value::Int(0));
        assert_eq!(Value::parse(ValueKind::Bool, "True"), Value::Bool(false));
        assert_eq!(Value::parse(ValueKind::Bool, "1"), Value::Bool(false));
        assert_eq!(Value::parse(ValueKind::Byte, "255"), Value::Byte(255));

        // Missing components keep their defaults
        assert_eq!(
            Value::parse(ValueKind::Vector3, "x:1 y:2"),
            Value::Vector3(Vec3::new(1.0, 2.0, 0.0))
        );
        assert_eq!(Value::parse(ValueKind::Color, ""), Value::Color(Color::WHITE));
    }

    #[test]
    fn test_string_stream_encoding() {
        let mut buf = Vec::new();
        Value::from("AB").write(&mut buf).unwrap();
        assert_eq!(buf, vec![2, b'A' + 128, b'B' + 128]);

        // Non-ASCII text survives the byte offset
        let text = Value::from("Größe");
        let mut buf = Vec::new();
        text.write(&mut buf).unwrap();
        let back = Value::read(ValueKind::String, &mut ByteReader::new(&buf)).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn test_string_too_long() {
        let long = Value::String("x".repeat(256));
        let mut buf = Vec::new();
        assert!(matches!(long.write(&mut buf), Err(Error::StringTooLong(256))));
    }

    #[test]
    fn test_fixed_widths() {
        let mut buf = Vec::new();
        Value::Bool(true).write(&mut buf).unwrap();
        Value::Short(-2).write(&mut buf).unwrap();
        Value::Color(Color::WHITE).write(&mut buf).unwrap();
        assert_eq!(buf.len(), 1 + 2 + 16);
        assert_eq!(&buf[..3], &[1, 0xFE, 0xFF]);
    }

    #[test]
    fn test_typed_access() {
        let v = Value::Float(1.5);
        assert_eq!(v.as_float().unwrap(), 1.5);
        assert!(matches!(
            v.as_int(),
            Err(Error::TypeMismatch { expected: "Int", actual: "Float" })
        ));
        let f: f32 = (&v).try_into().unwrap();
        assert_eq!(f, 1.5);
        assert!(String::try_from(&v).is_err());
    }

    #[test]
    fn test_raw_bytes_and_size() {
        let v = Value::UInt(0x01020304);
        assert_eq!(v.size(), 4);
        assert_eq!(v.raw_bytes().as_slice(), &[4, 3, 2, 1]);
        assert_eq!(Value::from_raw(ValueKind::UInt, &v.raw_bytes()).unwrap(), v);

        let s = Value::from("name");
        assert_eq!(s.size(), 4);
        assert_eq!(Value::from_raw(ValueKind::String, b"name").unwrap(), s);
    }

    #[test]
    fn test_defaults_and_kind_names() {
        assert_eq!(Value::default_for(ValueKind::Color), Value::Color(Color::WHITE));
        assert_eq!(Value::default_for(ValueKind::Vector3), Value::Vector3(Vec3::ZERO));
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_name(kind.name()).unwrap(), kind);
            assert_eq!(Value::default_for(kind).kind(), kind);
        }
        assert!(ValueKind::from_name("Matrix").is_err());
    }

    #[test]
    fn test_truncated_read() {
        let buf = [5u8, 0xC1];
        let err = Value::read(ValueKind::String, &mut ByteReader::new(&buf)).unwrap_err();
        assert!(err.is_format_error());
    }
}

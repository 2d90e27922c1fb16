//! Hashed object identifiers.
//!
//! An [`ObjectName`] is a 32-bit FNV-1a hash of a string. Names are compared
//! and keyed by hash only; the source string is kept in a process-wide
//! interning table so it can be recovered for diagnostics and for writing
//! content back out. Interned strings are never freed.
//!
//! Hash collisions are not resolved: two different strings with the same hash
//! are the same identifier. The table detects the case and logs it.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use parking_lot::RwLock;

/// Interned strings keyed by hash.
static NAME_TABLE: LazyLock<RwLock<HashMap<u32, &'static str>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn intern(id: u32, name: &str) {
    if let Some(existing) = NAME_TABLE.read().get(&id) {
        if *existing != name {
            tracing::warn!(
                id = format_args!("{:08x}", id),
                existing = *existing,
                colliding = name,
                "object name hash collision"
            );
        }
        return;
    }

    NAME_TABLE
        .write()
        .entry(id)
        .or_insert_with(|| Box::leak(name.to_owned().into_boxed_str()));
}

/// Hashed identifier with value semantics.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName(u32);

impl ObjectName {
    /// The empty identifier (hash 0).
    pub const EMPTY: Self = Self(0);

    /// Hash and intern a string.
    pub fn new(name: &str) -> Self {
        let id = fnv_hash::hash_str(name);
        if id != 0 {
            intern(id, name);
        }
        Self(id)
    }

    /// Wrap a raw hash without interning anything.
    #[inline]
    pub const fn from_id(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Recover the source string, if this name was created from one.
    pub fn as_str(&self) -> Option<&'static str> {
        if self.is_empty() {
            return Some("");
        }
        NAME_TABLE.read().get(&self.0).copied()
    }

    /// Source string, or the hash as eight hex digits when it is unknown.
    pub fn to_name_string(&self) -> String {
        match self.as_str() {
            Some(s) => s.to_owned(),
            None => format!("{:08x}", self.0),
        }
    }
}

impl From<&str> for ObjectName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for ObjectName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<String> for ObjectName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write!(f, "{:08x}", self.0),
        }
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "ObjectName({:?}, {:08x})", s, self.0),
            None => write!(f, "ObjectName({:08x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_hash() {
        assert_eq!(ObjectName::new("foo"), ObjectName::new("foo"));
        assert_ne!(ObjectName::new("foo"), ObjectName::new("bar"));
        assert_eq!(ObjectName::new("foo"), ObjectName::from_id(ObjectName::new("foo").id()));
    }

    #[test]
    fn test_string_recovery() {
        let name = ObjectName::new("HeroMesh");
        assert_eq!(name.as_str(), Some("HeroMesh"));
        assert_eq!(name.to_string(), "HeroMesh");

        let copy = ObjectName::from_id(name.id());
        assert_eq!(copy.as_str(), Some("HeroMesh"));
    }

    #[test]
    fn test_empty() {
        assert!(ObjectName::new("").is_empty());
        assert_eq!(ObjectName::default(), ObjectName::EMPTY);
        assert_eq!(ObjectName::EMPTY.as_str(), Some(""));
    }

    #[test]
    fn test_unknown_id_renders_hex() {
        let name = ObjectName::from_id(0x0000_beef);
        // Collides with nothing interned by these tests
        if name.as_str().is_none() {
            assert_eq!(name.to_name_string(), "0000beef");
        }
    }
}

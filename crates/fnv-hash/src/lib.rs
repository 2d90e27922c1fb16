//! FNV-1a 32-bit hash implementation.
//!
//! Fowler/Noll/Vo hash, public domain algorithm.
//! Produces output identical to the engine's C++ `hash()` helper, which walks a
//! NUL-terminated `char` string. Two entry points exist because `char` is signed
//! on the platforms the content was authored on: bytes >= 0x80 are sign-extended
//! before they are mixed in.

/// FNV-1a 32-bit offset basis.
pub const OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
pub const PRIME: u32 = 16_777_619;

/// Standard FNV-1a over raw bytes.
#[inline]
pub fn hash32(data: &[u8]) -> u32 {
    let mut hash = OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// FNV-1a with signed-char mixing, as used for engine identifiers.
///
/// Matches the C++ loop `hash ^= str[i]` where `str` is `const char*`.
/// An empty input maps to 0, the reserved "empty identifier" value.
#[inline]
pub fn hash32_signed(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }

    let mut hash = OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as i8 as i32 as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Convenience wrapper over [`hash32_signed`] for string identifiers.
#[inline]
pub fn hash_str(s: &str) -> u32 {
    hash32_signed(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(hash32(b""), 0x811c9dc5);
        assert_eq!(hash32(b"a"), 0xe40c292c);
        assert_eq!(hash32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_empty_identifier() {
        assert_eq!(hash32_signed(b""), 0);
        assert_eq!(hash_str(""), 0);
    }

    #[test]
    fn test_ascii_matches_standard() {
        // Sign extension only matters above 0x7f
        assert_eq!(hash32_signed(b"foobar"), hash32(b"foobar"));
        assert_eq!(hash_str("Mesh"), hash32(b"Mesh"));
    }

    #[test]
    fn test_high_bytes_sign_extended() {
        let data = [0xC3u8, 0xA9];
        assert_ne!(hash32_signed(&data), hash32(&data));

        let mut expected = OFFSET_BASIS;
        expected ^= 0xFFFF_FFC3;
        expected = expected.wrapping_mul(PRIME);
        expected ^= 0xFFFF_FFA9;
        expected = expected.wrapping_mul(PRIME);
        assert_eq!(hash32_signed(&data), expected);
    }
}

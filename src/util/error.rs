//! Error types for the content library.

use thiserror::Error;

/// Main error type for content operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content file does not exist in the content source
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// Binary file does not start with the expected magic tag
    #[error("Invalid magic tag: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: String, actual: String },

    /// Binary data is truncated
    #[error("Unexpected end of data at offset {offset} (needed {needed} bytes, {available} available)")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Invalid data structure in content
    #[error("Invalid content structure: {0}")]
    InvalidStructure(String),

    /// XML document could not be parsed or written
    #[error("XML error: {0}")]
    Xml(String),

    /// Value accessed with a kind other than its own
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Unknown value kind name
    #[error("Unknown value kind: {0}")]
    UnknownValueKind(String),

    /// Property not found by name
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// Property array not found by name
    #[error("Property array not found: {0}")]
    PropertyArrayNotFound(String),

    /// Attempted write to a property without setter
    #[error("Attempted write to read-only property: {0}")]
    ReadOnlyProperty(String),

    /// Array element index out of bounds
    #[error("Array index {index} out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// Two serializables do not expose the same property layout
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// An object with the same name is already registered
    #[error("Duplicate object name: {0}")]
    DuplicateName(String),

    /// No object manager registered for a resource type
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// String does not fit the one-byte length prefix of the stream encoding
    #[error("String too long for stream encoding ({0} bytes, max 255)")]
    StringTooLong(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Settings file could not be parsed
    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an XML error from anything displayable.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }

    /// True for errors caused by malformed content rather than API misuse.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::UnexpectedEof { .. }
                | Self::InvalidStructure(_)
                | Self::Xml(_)
                | Self::Utf8(_)
        )
    }
}

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::ReadOnlyProperty("VertexCount".into());
        assert!(e.to_string().contains("read-only"));

        let e = Error::UnexpectedEof { offset: 8, needed: 4, available: 2 };
        assert!(e.to_string().contains("8"));
        assert!(e.to_string().contains("4"));
        assert!(e.is_format_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_format_error());
    }
}

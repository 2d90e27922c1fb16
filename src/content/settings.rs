//! Content pipeline settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::Result;

/// Environment variable overriding [`ContentSettings::root`].
pub const ENV_CONTENT_ROOT: &str = "GE_CONTENT_ROOT";

/// Environment variable overriding [`ContentSettings::format`].
pub const ENV_CONTENT_FORMAT: &str = "GE_CONTENT_FORMAT";

/// Which encoding resource descriptors are loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// XML descriptors (`.xml`), used during development
    #[default]
    Xml,
    /// Packed binary descriptors (`.ge`)
    Binary,
}

impl ContentFormat {
    /// Extension suffix of descriptor files in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentFormat::Xml => "xml",
            ContentFormat::Binary => "ge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Some(ContentFormat::Xml),
            "binary" | "bin" | "ge" => Some(ContentFormat::Binary),
            _ => None,
        }
    }
}

/// Settings for a content manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Root directory of the content tree
    pub root: PathBuf,
    pub format: ContentFormat,
    /// Register the built-in Quad, Cube and Sphere meshes on startup
    pub builtin_meshes: bool,
    /// Language used when a string table is missing for the requested one
    pub fallback_language: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
            format: ContentFormat::Xml,
            builtin_meshes: true,
            fallback_language: "en".to_owned(),
        }
    }
}

impl ContentSettings {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `GE_CONTENT_ROOT` / `GE_CONTENT_FORMAT` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_CONTENT_ROOT).ok(),
            std::env::var(ENV_CONTENT_FORMAT).ok(),
        )
    }

    fn with_overrides(mut self, root: Option<String>, format: Option<String>) -> Self {
        if let Some(root) = root.filter(|r| !r.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(format) = format {
            match ContentFormat::parse(&format) {
                Some(f) => self.format = f,
                None => tracing::warn!(value = %format, "ignoring unknown {}", ENV_CONTENT_FORMAT),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let s: ContentSettings = serde_json::from_str(r#"{ "format": "binary" }"#).unwrap();
        assert_eq!(s.format, ContentFormat::Binary);
        assert_eq!(s.root, PathBuf::from("content"));
        assert!(s.builtin_meshes);
    }

    #[test]
    fn test_save_load() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let s = ContentSettings {
            root: PathBuf::from("/data/game"),
            builtin_meshes: false,
            ..Default::default()
        };
        s.save(file.path()).unwrap();
        assert_eq!(ContentSettings::load(file.path()).unwrap(), s);
    }

    #[test]
    fn test_overrides() {
        let s = ContentSettings::default()
            .with_overrides(Some("/tmp/assets".into()), Some("BIN".into()));
        assert_eq!(s.root, PathBuf::from("/tmp/assets"));
        assert_eq!(s.format, ContentFormat::Binary);

        let s = ContentSettings::default().with_overrides(None, Some("yaml".into()));
        assert_eq!(s.format, ContentFormat::Xml);
    }

    #[test]
    fn test_invalid_json() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), "{ not json").unwrap();
        assert!(matches!(
            ContentSettings::load(file.path()),
            Err(crate::Error::Settings(_))
        ));
    }
}

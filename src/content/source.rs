//! Content file access.
//!
//! Loaders never open files themselves. They ask a [`ContentSource`] for
//! `<subdir>/<name>.<extension>` and get the whole file back as
//! [`ContentData`]. [`FsContentSource`] serves a directory tree,
//! [`MemoryContentSource`] serves an in-memory table.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use parking_lot::RwLock;

use crate::util::{Error, Result};

/// Category of a content file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    GenericTextData,
    GenericBinaryData,
    Texture,
    FontData,
    FontTexture,
    Audio,
    Shader,
}

/// Bytes of one content file.
pub enum ContentData {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mapped(Mmap),
}

impl ContentData {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ContentData::Owned(v) => v,
            #[cfg(feature = "mmap")]
            ContentData::Mapped(m) => m,
        }
    }

    /// Content as UTF-8 text.
    pub fn as_text(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes())
            .map_err(|e| Error::invalid(format!("content is not UTF-8: {}", e)))
    }
}

impl Deref for ContentData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ContentData {
    fn from(bytes: Vec<u8>) -> Self {
        ContentData::Owned(bytes)
    }
}

impl fmt::Debug for ContentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentData({} bytes)", self.as_bytes().len())
    }
}

/// Relative path of a content file: `subdir/name.extension`.
pub fn content_path(subdir: &str, name: &str, extension: &str) -> String {
    let file = if extension.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", name, extension)
    };
    if subdir.is_empty() {
        file
    } else {
        format!("{}/{}", subdir.trim_end_matches('/'), file)
    }
}

/// Read access to content files.
pub trait ContentSource: Send + Sync {
    /// Read a whole file. Missing files are [`Error::ContentNotFound`].
    fn read(&self, kind: ContentKind, subdir: &str, name: &str, extension: &str)
        -> Result<ContentData>;

    /// Names (without extension) of the files in `subdir` ending in `.extension`.
    fn list(&self, subdir: &str, extension: &str) -> Result<Vec<String>>;

    fn exists(&self, kind: ContentKind, subdir: &str, name: &str, extension: &str) -> bool {
        self.read(kind, subdir, name, extension).is_ok()
    }
}

/// Content served from a directory tree.
#[derive(Clone, Debug)]
pub struct FsContentSource {
    root: PathBuf,
    use_mmap: bool,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_mmap: cfg!(feature = "mmap"),
        }
    }

    /// Force buffered reads even when memory maps are available.
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap && cfg!(feature = "mmap");
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, subdir: &str, name: &str, extension: &str) -> PathBuf {
        self.root.join(content_path(subdir, name, extension))
    }
}

impl ContentSource for FsContentSource {
    fn read(
        &self,
        _kind: ContentKind,
        subdir: &str,
        name: &str,
        extension: &str,
    ) -> Result<ContentData> {
        let path = self.path_of(subdir, name, extension);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ContentNotFound(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();
        tracing::trace!(path = %path.display(), size, "reading content file");

        #[cfg(feature = "mmap")]
        if self.use_mmap && size > 0 {
            // Safety: content files are opened read-only and not modified while mapped
            let mmap = unsafe { Mmap::map(&file) }?;
            return Ok(ContentData::Mapped(mmap));
        }

        let mut bytes = Vec::with_capacity(size as usize);
        std::io::Read::read_to_end(&mut &file, &mut bytes)?;
        Ok(ContentData::Owned(bytes))
    }

    fn list(&self, subdir: &str, extension: &str) -> Result<Vec<String>> {
        let dir = self.root.join(subdir);
        let suffix = format!(".{}", extension);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            if let Some(stem) = file_name.strip_suffix(&suffix) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Content served from memory, keyed by relative path.
#[derive(Debug, Default)]
pub struct MemoryContentSource {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subdir: &str, name: &str, extension: &str, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .insert(content_path(subdir, name, extension), bytes.into());
    }

    pub fn remove(&self, subdir: &str, name: &str, extension: &str) -> bool {
        self.files
            .write()
            .remove(&content_path(subdir, name, extension))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl ContentSource for MemoryContentSource {
    fn read(
        &self,
        _kind: ContentKind,
        subdir: &str,
        name: &str,
        extension: &str,
    ) -> Result<ContentData> {
        let path = content_path(subdir, name, extension);
        self.files
            .read()
            .get(&path)
            .map(|bytes| ContentData::Owned(bytes.clone()))
            .ok_or(Error::ContentNotFound(path))
    }

    fn list(&self, subdir: &str, extension: &str) -> Result<Vec<String>> {
        let prefix = if subdir.is_empty() {
            String::new()
        } else {
            format!("{}/", subdir.trim_end_matches('/'))
        };
        let suffix = format!(".{}", extension);
        Ok(self
            .files
            .read()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .filter_map(|rest| rest.strip_suffix(&suffix))
            .map(str::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_path() {
        assert_eq!(content_path("Meshes", "hero", "mesh.ge"), "Meshes/hero.mesh.ge");
        assert_eq!(content_path("", "config", "json"), "config.json");
        assert_eq!(content_path("Fonts/", "arial", ""), "Fonts/arial");
    }

    #[test]
    fn test_memory_source() {
        let src = MemoryContentSource::new();
        src.insert("Meshes", "a", "mesh.ge", vec![1, 2, 3]);
        src.insert("Meshes", "b", "mesh.ge", vec![4]);
        src.insert("Meshes/Sub", "c", "mesh.ge", vec![5]);
        src.insert("Meshes", "d", "skeleton.ge", vec![6]);

        let data = src
            .read(ContentKind::GenericBinaryData, "Meshes", "a", "mesh.ge")
            .unwrap();
        assert_eq!(&*data, &[1, 2, 3]);

        assert_eq!(src.list("Meshes", "mesh.ge").unwrap(), vec!["a", "b"]);
        assert!(matches!(
            src.read(ContentKind::GenericBinaryData, "Meshes", "zzz", "mesh.ge"),
            Err(Error::ContentNotFound(_))
        ));
    }

    #[test]
    fn test_fs_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("Shaders")).unwrap();
        std::fs::write(dir.path().join("Shaders/basic.xml"), b"<ShaderProgramList/>").unwrap();
        std::fs::write(dir.path().join("Shaders/empty.xml"), b"").unwrap();

        for mmap in [true, false] {
            let src = FsContentSource::new(dir.path()).with_mmap(mmap);
            let data = src
                .read(ContentKind::GenericTextData, "Shaders", "basic", "xml")
                .unwrap();
            assert_eq!(data.as_text().unwrap(), "<ShaderProgramList/>");

            let empty = src
                .read(ContentKind::GenericTextData, "Shaders", "empty", "xml")
                .unwrap();
            assert!(empty.is_empty());
        }

        let src = FsContentSource::new(dir.path());
        assert_eq!(src.list("Shaders", "xml").unwrap(), vec!["basic", "empty"]);
        assert!(src.list("Missing", "xml").unwrap().is_empty());
        assert!(!src.exists(ContentKind::GenericTextData, "Shaders", "nope", "xml"));
    }
}

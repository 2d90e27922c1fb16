//! # GE content
//!
//! Content layer of a real-time game engine: a reflective property system,
//! tagged values with XML and binary encodings, and loaders for the assets
//! a game ships with.
//!
//! ## Modules
//!
//! - [`util`] - Errors, binary cursor and math types
//! - [`core`] - Object names, values, XML trees, reflection and registries
//! - [`content`] - Content sources, meshes, skeletons, animations, fonts and the content manager
//! - [`rendering`] - Shader programs and materials
//! - [`audio`] - Audio events and banks
//! - [`localization`] - Localized string tables
//!
//! ## Example
//!
//! ```ignore
//! use ge_content::prelude::*;
//!
//! let settings = ContentSettings::from_env();
//! let mut content = ContentManager::new(settings)?;
//! let mesh = content.load_mesh("Barrel", ObjectName::EMPTY)?;
//! println!("{} vertices", mesh.vertex_count());
//! ```

pub mod util;
pub mod core;
pub mod content;
pub mod rendering;
pub mod audio;
pub mod localization;

// Re-export commonly used types
pub use crate::util::{Error, Result};
pub use crate::core::{ObjectName, Value, ValueKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Color, Rotation};
    pub use crate::core::{Named, ObjectManager, ObjectName, Reflect, Serializable, Value, ValueKind, XmlNode};
    pub use crate::content::{
        AnimationSet, ContentFormat, ContentManager, ContentSettings, ContentSource, Font, FsContentSource,
        ListedResource, Mesh, Resource, ResourcesManager, Skeleton,
    };
    pub use crate::rendering::{Material, ShaderProgram};
    pub use crate::audio::{AudioBank, AudioEvent};
    pub use crate::localization::LocalizedString;
}

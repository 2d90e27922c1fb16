//! Content loading.
//!
//! - [`ContentSource`] - where raw bytes come from (file system or memory)
//! - [`Mesh`], [`Skeleton`], [`AnimationSet`], [`Font`] - binary and XML assets
//! - [`ResourcesManager`] - one registry per resource type
//! - [`ContentManager`] - ties settings, sources and registries together
//! - [`BackgroundLoader`] - decode jobs off the calling thread

mod animation;
mod background;
mod font;
pub mod list;
mod manager;
mod mesh;
mod primitives;
mod resource;
mod resources;
mod settings;
mod skeleton;
mod source;

pub use animation::*;
pub use background::*;
pub use font::*;
pub use manager::*;
pub use mesh::*;
pub use primitives::*;
pub use resource::*;
pub use resources::*;
pub use settings::*;
pub use skeleton::*;
pub use source::*;

//! Named, grouped content assets.

use std::fmt;

use crate::core::{Named, ObjectName, Reflect};

/// Resource families the content pipeline knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    ShaderProgram,
    Material,
    Font,
    Mesh,
    Skeleton,
    AnimationSet,
    AudioEvent,
    AudioBank,
    LocalizedString,
}

impl ResourceType {
    pub const ALL: [ResourceType; 9] = [
        ResourceType::ShaderProgram,
        ResourceType::Material,
        ResourceType::Font,
        ResourceType::Mesh,
        ResourceType::Skeleton,
        ResourceType::AnimationSet,
        ResourceType::AudioEvent,
        ResourceType::AudioBank,
        ResourceType::LocalizedString,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ResourceType::ShaderProgram => "ShaderProgram",
            ResourceType::Material => "Material",
            ResourceType::Font => "Font",
            ResourceType::Mesh => "Mesh",
            ResourceType::Skeleton => "Skeleton",
            ResourceType::AnimationSet => "AnimationSet",
            ResourceType::AudioEvent => "AudioEvent",
            ResourceType::AudioBank => "AudioBank",
            ResourceType::LocalizedString => "LocalizedString",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named asset, optionally grouped under a secondary name.
///
/// Each implementor is owned by exactly one [`ObjectManager`](crate::core::ObjectManager)
/// inside the [`ResourcesManager`](super::ResourcesManager), which routes by
/// [`TYPE_NAME`](Self::TYPE_NAME).
pub trait Resource: Named + Send + 'static {
    /// Registry key, e.g. `"Mesh"`.
    const TYPE_NAME: &'static str;

    fn group_name(&self) -> ObjectName;

    /// Approximate memory held by the resource payload.
    fn size_in_bytes(&self) -> usize {
        0
    }
}

/// A resource declared in a list document and loaded through reflection.
///
/// The list lives at `<SUBDIR>/<list>.<LIST_SUFFIX>.{xml,ge}`. In XML it is a
/// `<LIST_ROOT>` element with one `<ELEMENT name="..">` child per instance;
/// packed, it is a `Byte` count followed by `ObjectName` + stream-encoded
/// properties per instance.
pub trait ListedResource: Resource + Reflect {
    const SUBDIR: &'static str;
    const LIST_SUFFIX: &'static str;
    const LIST_ROOT: &'static str;
    const ELEMENT: &'static str;

    /// Fresh instance with default property values.
    fn create(name: ObjectName, group: ObjectName) -> Self;
}

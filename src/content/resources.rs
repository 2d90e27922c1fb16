//! Type-keyed registry of resource managers.

use std::collections::HashMap;

use super::{Mesh, Primitive, Resource};
use crate::core::{Named, ObjectManager, ObjectName, ObjectRegistry};
use crate::util::{Error, Result};

/// Owns one [`ObjectManager`] per registered resource type.
///
/// Managers are keyed by [`Resource::TYPE_NAME`]. Typed calls downcast to
/// the concrete manager; untyped callers go through [`ObjectRegistry`].
pub struct ResourcesManager {
    registries: HashMap<ObjectName, Box<dyn ObjectRegistry>>,
}

impl ResourcesManager {
    /// Empty registry with no types registered.
    pub fn empty() -> Self {
        Self {
            registries: HashMap::new(),
        }
    }

    /// Registry for every resource type of the crate, optionally with the
    /// built-in `Quad`, `Cube` and `Sphere` meshes.
    pub fn new(builtin_meshes: bool) -> Result<Self> {
        let mut manager = Self::empty();
        manager.register::<Mesh>();
        manager.register::<super::Skeleton>();
        manager.register::<super::AnimationSet>();
        manager.register::<super::Font>();
        manager.register::<crate::rendering::ShaderProgram>();
        manager.register::<crate::rendering::Material>();
        manager.register::<crate::audio::AudioEvent>();
        manager.register::<crate::audio::AudioBank>();
        manager.register::<crate::localization::LocalizedString>();
        if builtin_meshes {
            manager.load_builtin_meshes()?;
        }
        Ok(manager)
    }

    fn load_builtin_meshes(&mut self) -> Result<()> {
        let shapes = [
            ("Sphere", Primitive::sphere(1.0, 48, 24)),
            ("Quad", Primitive::quad(1.0)),
            ("Cube", Primitive::cube(1.0)),
        ];
        for (name, primitive) in shapes {
            self.add(Mesh::from_primitive(ObjectName::new(name), &primitive)?)?;
        }
        tracing::debug!("registered built-in meshes");
        Ok(())
    }

    /// Register a manager for `T`. Registering twice keeps the existing one.
    pub fn register<T: Resource>(&mut self) {
        self.registries
            .entry(ObjectName::new(T::TYPE_NAME))
            .or_insert_with(|| Box::new(ObjectManager::<T>::new()));
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registries.contains_key(&ObjectName::new(type_name))
    }

    /// Untyped view of the manager for `type_name`.
    pub fn registry(&self, type_name: &str) -> Result<&dyn ObjectRegistry> {
        self.registries
            .get(&ObjectName::new(type_name))
            .map(|r| &**r)
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_owned()))
    }

    pub fn registry_mut(&mut self, type_name: &str) -> Result<&mut (dyn ObjectRegistry + 'static)> {
        self.registries
            .get_mut(&ObjectName::new(type_name))
            .map(|r| &mut **r)
            .ok_or_else(|| Error::UnknownResourceType(type_name.to_owned()))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registries.keys().map(|n| n.to_name_string()).collect();
        names.sort();
        names
    }

    pub fn manager<T: Resource>(&self) -> Result<&ObjectManager<T>> {
        self.registry(T::TYPE_NAME)?
            .as_any()
            .downcast_ref::<ObjectManager<T>>()
            .ok_or_else(|| Error::UnknownResourceType(T::TYPE_NAME.to_owned()))
    }

    pub fn manager_mut<T: Resource>(&mut self) -> Result<&mut ObjectManager<T>> {
        self.registry_mut(T::TYPE_NAME)?
            .as_any_mut()
            .downcast_mut::<ObjectManager<T>>()
            .ok_or_else(|| Error::UnknownResourceType(T::TYPE_NAME.to_owned()))
    }

    /// Take ownership of a resource. Fails on a duplicate name.
    pub fn add<T: Resource>(&mut self, resource: T) -> Result<&mut T> {
        self.manager_mut::<T>()?.add(resource)
    }

    /// Add several resources, or none if any name would collide.
    pub fn add_all<T: Resource>(&mut self, resources: Vec<T>) -> Result<()> {
        let manager = self.manager_mut::<T>()?;
        let mut seen = Vec::with_capacity(resources.len());
        for r in &resources {
            let name = r.name();
            if manager.contains(name) || seen.contains(&name) {
                return Err(Error::DuplicateName(name.to_name_string()));
            }
            seen.push(name);
        }
        for r in resources {
            manager.add(r)?;
        }
        Ok(())
    }

    pub fn get<T: Resource>(&self, name: ObjectName) -> Option<&T> {
        self.manager::<T>().ok()?.get(name)
    }

    pub fn get_mut<T: Resource>(&mut self, name: ObjectName) -> Option<&mut T> {
        self.manager_mut::<T>().ok()?.get_mut(name)
    }

    pub fn remove<T: Resource>(&mut self, name: ObjectName) -> bool {
        self.manager_mut::<T>().is_ok_and(|m| m.remove(name))
    }

    pub fn clear<T: Resource>(&mut self) {
        if let Ok(m) = self.manager_mut::<T>() {
            m.clear();
        }
    }

    pub fn count<T: Resource>(&self) -> usize {
        self.manager::<T>().map_or(0, ObjectManager::count)
    }

    /// Resources of `T` with the given group name.
    pub fn in_group<T: Resource>(&self, group: ObjectName) -> Vec<&T> {
        self.manager::<T>()
            .map(|m| m.iter().filter(|r| r.group_name() == group).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ResourcesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(String, usize)> = self
            .type_names()
            .into_iter()
            .map(|t| {
                let count = self.registry(&t).map_or(0, |r| r.count());
                (t, count)
            })
            .collect();
        f.debug_struct("ResourcesManager").field("registries", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Skeleton;
    use crate::rendering::Material;

    #[test]
    fn test_builtin_meshes() {
        let resources = ResourcesManager::new(true).unwrap();
        assert_eq!(resources.count::<Mesh>(), 3);
        let sphere = resources.get::<Mesh>(ObjectName::new("Sphere")).unwrap();
        assert_eq!(sphere.vertex_count(), 48 * 24);
        assert!(resources.get::<Mesh>(ObjectName::new("Cube")).is_some());

        let bare = ResourcesManager::new(false).unwrap();
        assert_eq!(bare.count::<Mesh>(), 0);
    }

    #[test]
    fn test_routing_by_type_name() {
        let mut resources = ResourcesManager::new(false).unwrap();
        resources
            .add(Material::new(ObjectName::new("Stone"), ObjectName::new("world")))
            .unwrap();
        assert!(resources
            .add(Material::new(ObjectName::new("Stone"), ObjectName::EMPTY))
            .is_err());

        let registry = resources.registry("Material").unwrap();
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(ObjectName::new("Stone")));
        assert_eq!(resources.in_group::<Material>(ObjectName::new("world")).len(), 1);

        assert!(resources.remove::<Material>(ObjectName::new("Stone")));
        assert!(!resources.remove::<Material>(ObjectName::new("Stone")));
        assert!(matches!(
            resources.registry("Texture"),
            Err(Error::UnknownResourceType(_))
        ));
    }

    #[test]
    fn test_unregistered_type() {
        let mut resources = ResourcesManager::empty();
        let skeleton = Skeleton::new(ObjectName::new("Rig"), vec![crate::content::Bone::new(0, ObjectName::new("Root"))]).unwrap();
        assert!(matches!(resources.add(skeleton), Err(Error::UnknownResourceType(_))));
        resources.register::<Skeleton>();
        assert!(resources.type_names().contains(&"Skeleton".to_owned()));
    }

    #[test]
    fn test_add_all_is_atomic() {
        let mut resources = ResourcesManager::new(false).unwrap();
        let batch = vec![
            Material::new(ObjectName::new("A"), ObjectName::EMPTY),
            Material::new(ObjectName::new("B"), ObjectName::EMPTY),
            Material::new(ObjectName::new("A"), ObjectName::EMPTY),
        ];
        assert!(resources.add_all(batch).is_err());
        assert_eq!(resources.count::<Material>(), 0);
    }
}

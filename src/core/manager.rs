//! Owning keyed collections of named objects.

use std::any::Any;
use std::collections::HashMap;

use super::ObjectName;
use crate::util::{Error, Result};

/// Anything identified by an [`ObjectName`].
pub trait Named {
    fn name(&self) -> ObjectName;
}

/// Exclusive-ownership registry keyed by name.
///
/// Iteration order is the hash map's and must not be relied on.
#[derive(Debug)]
pub struct ObjectManager<T> {
    objects: HashMap<ObjectName, T>,
}

impl<T> Default for ObjectManager<T> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }
}

impl<T: Named> ObjectManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `object`. Fails if its name is already registered.
    pub fn add(&mut self, object: T) -> Result<&mut T> {
        let name = object.name();
        match self.objects.entry(name) {
            std::collections::hash_map::Entry::Occupied(_) => {
                Err(Error::DuplicateName(name.to_name_string()))
            }
            std::collections::hash_map::Entry::Vacant(slot) => Ok(slot.insert(object)),
        }
    }

    #[inline]
    pub fn get(&self, name: ObjectName) -> Option<&T> {
        self.objects.get(&name)
    }

    #[inline]
    pub fn get_mut(&mut self, name: ObjectName) -> Option<&mut T> {
        self.objects.get_mut(&name)
    }

    #[inline]
    pub fn contains(&self, name: ObjectName) -> bool {
        self.objects.contains_key(&name)
    }

    /// Drop the object registered under `name`. Returns whether it existed.
    pub fn remove(&mut self, name: ObjectName) -> bool {
        self.objects.remove(&name).is_some()
    }

    /// Remove and return the object registered under `name`.
    pub fn take(&mut self, name: ObjectName) -> Option<T> {
        self.objects.remove(&name)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Visit every object mutably until `f` returns `false`.
    pub fn iterate<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        for object in self.objects.values_mut() {
            if !f(object) {
                break;
            }
        }
    }

    /// Visit every object until `f` returns `false`.
    pub fn iterate_const<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        for object in self.objects.values() {
            if !f(object) {
                break;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.objects.values()
    }

    pub fn names(&self) -> Vec<ObjectName> {
        self.objects.keys().copied().collect()
    }

    /// Remove every object for which `keep` returns `false`. Returns how many went.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.objects.len();
        self.objects.retain(|_, object| keep(object));
        before - self.objects.len()
    }
}

/// Type-erased view of an [`ObjectManager`].
pub trait ObjectRegistry: Any + Send {
    fn count(&self) -> usize;
    fn contains(&self, name: ObjectName) -> bool;
    fn remove(&mut self, name: ObjectName) -> bool;
    fn clear(&mut self);
    fn names(&self) -> Vec<ObjectName>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Named + Send + 'static> ObjectRegistry for ObjectManager<T> {
    fn count(&self) -> usize {
        ObjectManager::count(self)
    }

    fn contains(&self, name: ObjectName) -> bool {
        ObjectManager::contains(self, name)
    }

    fn remove(&mut self, name: ObjectName) -> bool {
        ObjectManager::remove(self, name)
    }

    fn clear(&mut self) {
        ObjectManager::clear(self)
    }

    fn names(&self) -> Vec<ObjectName> {
        ObjectManager::names(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Entry {
        name: ObjectName,
        value: i32,
    }

    impl Entry {
        fn new(name: &str, value: i32) -> Self {
            Self { name: ObjectName::new(name), value }
        }
    }

    impl Named for Entry {
        fn name(&self) -> ObjectName {
            self.name
        }
    }

    #[test]
    fn test_add_get_remove() {
        let mut mgr = ObjectManager::new();
        mgr.add(Entry::new("a", 1)).unwrap();
        mgr.add(Entry::new("b", 2)).unwrap();
        assert_eq!(mgr.count(), 2);
        assert_eq!(mgr.get(ObjectName::new("a")).map(|e| e.value), Some(1));
        assert!(mgr.get(ObjectName::new("zzz")).is_none());

        assert!(mgr.remove(ObjectName::new("a")));
        assert!(!mgr.remove(ObjectName::new("a")));
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut mgr = ObjectManager::new();
        mgr.add(Entry::new("dup", 1)).unwrap();
        let err = mgr.add(Entry::new("dup", 2)).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "dup"));
        // Original entry untouched
        assert_eq!(mgr.get(ObjectName::new("dup")).map(|e| e.value), Some(1));
    }

    #[test]
    fn test_iterate_stops_early() {
        let mut mgr = ObjectManager::new();
        for i in 0..10 {
            mgr.add(Entry::new(&format!("e{}", i), i)).unwrap();
        }

        let mut visited = 0;
        mgr.iterate_const(|_| {
            visited += 1;
            visited < 3
        });
        assert_eq!(visited, 3);

        mgr.iterate(|e| {
            e.value *= 10;
            true
        });
        assert!(mgr.iter().all(|e| e.value % 10 == 0));
    }

    #[test]
    fn test_clear_and_erased_view() {
        let mut mgr = ObjectManager::new();
        mgr.add(Entry::new("x", 0)).unwrap();

        let registry: &mut dyn ObjectRegistry = &mut mgr;
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(ObjectName::new("x")));
        assert!(registry.as_any().downcast_ref::<ObjectManager<Entry>>().is_some());
        registry.clear();
        assert_eq!(registry.count(), 0);
        assert!(mgr.is_empty());
    }
}

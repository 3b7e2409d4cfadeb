use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::error::{LayoutError, LayoutResult};

use super::{create::create_class, ClassDescriptor, ClassSpec};

/// Published class descriptors, keyed by class name.
///
/// Every descriptor is written once by its own creation and only read afterwards.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<IndexMap<String, Arc<ClassDescriptor>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Arc<ClassDescriptor>>> {
        self.classes.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Arc<ClassDescriptor>>> {
        self.classes.write().unwrap_or_else(PoisonError::into_inner)
    }
    /// Creates the class and publishes it. A failed creation publishes nothing.
    pub fn create(&self, spec: ClassSpec) -> LayoutResult<Arc<ClassDescriptor>> {
        if self.contains(&spec.name) {
            return Err(LayoutError::DuplicateClass { name: spec.name });
        }
        let descriptor = Arc::new(create_class(spec)?);
        let mut classes = self.write();
        // another creation of the same name may have been published meanwhile
        if classes.contains_key(descriptor.name()) {
            return Err(LayoutError::DuplicateClass {
                name: descriptor.name().to_string(),
            });
        }
        classes.insert(descriptor.name().to_string(), descriptor.clone());
        Ok(descriptor)
    }
    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.read().get(name).cloned()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
    /// Class names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }
    /// Unpublishes a class. Subclasses and live instances keep their own reference.
    pub fn remove(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.write().shift_remove(name)
    }
}

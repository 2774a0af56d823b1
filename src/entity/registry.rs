//! Process-lifetime descriptor cache.
//!
//! Descriptors are built lazily on first use of an entity type and never
//! torn down. First-use races are resolved by building outside the write
//! lock and publishing under it: exactly one build wins, losers adopt it.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::entity::{Entity, EntityDescriptor};
use crate::error::RelqResult;

static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static EntityDescriptor>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<TypeId, &'static EntityDescriptor>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The cached descriptor for `T`, building it on first use.
pub fn descriptor_of<T: Entity>() -> RelqResult<&'static EntityDescriptor> {
    let lock = registry();
    let key = TypeId::of::<T>();

    {
        let map = lock.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(descriptor) = map.get(&key) {
            return Ok(descriptor);
        }
    }

    // Build without holding the lock; duplicate concurrent builds are
    // harmless because only the first insert is published.
    let built = EntityDescriptor::build::<T>()?;
    let mut map = lock.write().unwrap_or_else(PoisonError::into_inner);
    Ok(map
        .entry(key)
        .or_insert_with(|| Box::leak(Box::new(built))))
}

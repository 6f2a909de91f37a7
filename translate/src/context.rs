// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-invocation state handed to customizers.
//!
//! One context spans one registry invocation: a whole write batch, or one
//! recursive read. The context carries the open naming transaction and a
//! dump cache, so every customizer involved in the invocation shares one
//! consistent view of the device.

use naming::{MappingContext, SharedNamingStore};
use std::any::Any;
use std::collections::HashMap;

/// Cache for device dump results, scoped to one registry invocation.
///
/// Several customizers frequently need the same expensive device dump (e.g.
/// the interface table). The first one stores the result under a well-known
/// key; the rest pick it up instead of issuing a second query. Because the
/// cache never outlives the invocation, every answer within one read comes
/// from the same device snapshot.
#[derive(Default)]
pub struct DumpCache {
    entries: HashMap<String, Box<dyn Any + Send>>,
}

impl std::fmt::Debug for DumpCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DumpCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + 'static>(&mut self, key: &str, value: T) {
        self.entries.insert(key.to_string(), Box::new(value));
    }

    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|boxed| boxed.downcast_ref())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Context of one write batch: the open naming transaction plus dump cache.
#[derive(Debug)]
pub struct WriteContext {
    naming: MappingContext,
    cache: DumpCache,
}

impl WriteContext {
    #[must_use]
    pub(crate) fn new(store: SharedNamingStore) -> Self {
        Self {
            naming: MappingContext::open(store),
            cache: DumpCache::new(),
        }
    }

    /// The naming transaction of this batch. Allocations and removals made
    /// here commit or roll back together with the batch.
    pub fn naming(&mut self) -> &mut MappingContext {
        &mut self.naming
    }

    pub fn cache(&mut self) -> &mut DumpCache {
        &mut self.cache
    }

    pub(crate) fn into_naming(self) -> MappingContext {
        self.naming
    }
}

/// Context of one recursive read: naming lookups plus dump cache.
///
/// The naming transaction of a read is never committed; anything a reader
/// records in it is dropped when the read finishes.
#[derive(Debug)]
pub struct ReadContext {
    naming: MappingContext,
    cache: DumpCache,
}

impl ReadContext {
    #[must_use]
    pub(crate) fn new(store: SharedNamingStore) -> Self {
        Self {
            naming: MappingContext::open(store),
            cache: DumpCache::new(),
        }
    }

    /// Snapshot view of the committed naming state.
    pub fn naming(&mut self) -> &mut MappingContext {
        &mut self.naming
    }

    pub fn cache(&mut self) -> &mut DumpCache {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use naming::{NamingStore, store::shared};
    use pretty_assertions::assert_eq;

    #[test]
    fn cache_is_typed() {
        let mut cache = DumpCache::new();
        cache.insert("interface-dump", vec![1_u32, 2, 3]);
        assert_eq!(cache.get::<Vec<u32>>("interface-dump"), Some(&vec![1, 2, 3]));
        // wrong type or key yields nothing
        assert!(cache.get::<String>("interface-dump").is_none());
        assert!(cache.get::<Vec<u32>>("other-dump").is_none());
        assert!(cache.contains("interface-dump"));
    }

    #[test]
    fn read_context_sees_committed_names() {
        let store = shared(NamingStore::in_memory());
        {
            let mut setup = MappingContext::open(store.clone());
            let _ = setup.get_or_allocate("interfaces", "eth0");
            setup.commit().unwrap();
        }
        let mut ctx = ReadContext::new(store);
        assert!(ctx.naming().contains("interfaces", "eth0"));
        assert!(!ctx.naming().contains("interfaces", "eth1"));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transactional view over the naming store.
//!
//! A [`MappingContext`] is opened for the duration of one configuration
//! change (or one read). Namespaces are snapshotted on first touch, so one
//! context always sees one frozen view of the store; every mutation lands in
//! the private snapshot. Committing swaps the touched namespaces back into
//! the shared store under the write lock and persists it, so concurrent
//! readers observe either none or all of a change's allocations. Dropping
//! the context without committing discards everything, which is how a
//! reverted batch sheds its naming side effects.

use crate::context::{Handle, NamingContext, NamingError};
use crate::store::{SharedNamingStore, StoreError};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

#[derive(Debug)]
pub struct MappingContext {
    store: SharedNamingStore,
    touched: BTreeMap<String, NamingContext>,
}

impl MappingContext {
    #[must_use]
    pub fn open(store: SharedNamingStore) -> Self {
        Self {
            store,
            touched: BTreeMap::new(),
        }
    }

    fn namespace_mut(&mut self, namespace: &str) -> &mut NamingContext {
        match self.touched.entry(namespace.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let snapshot = self
                    .store
                    .read()
                    .context(namespace)
                    .cloned()
                    .unwrap_or_default();
                vacant.insert(snapshot)
            }
        }
    }

    /// Handle mapped to `name` in `namespace`, allocating on first use.
    pub fn get_or_allocate(&mut self, namespace: &str, name: &str) -> Handle {
        self.namespace_mut(namespace).get_or_allocate(name)
    }

    /// Record an externally discovered association.
    pub fn learn(
        &mut self,
        namespace: &str,
        name: &str,
        handle: Handle,
    ) -> Result<(), NamingError> {
        self.namespace_mut(namespace).learn(name, handle)
    }

    /// Drop the association for `name`, returning its handle.
    pub fn remove(&mut self, namespace: &str, name: &str) -> Option<Handle> {
        self.namespace_mut(namespace).remove(name)
    }

    pub fn handle_of(&mut self, namespace: &str, name: &str) -> Option<Handle> {
        self.namespace_mut(namespace).handle_of(name)
    }

    pub fn name_of(&mut self, namespace: &str, handle: Handle) -> Option<String> {
        self.namespace_mut(namespace)
            .name_of(handle)
            .map(ToString::to_string)
    }

    pub fn contains(&mut self, namespace: &str, name: &str) -> bool {
        self.handle_of(namespace, name).is_some()
    }

    /// Publish all touched namespaces and persist the store.
    pub fn commit(self) -> Result<(), StoreError> {
        let mut store = self.store.write();
        for (namespace, context) in self.touched {
            debug!("Committing naming context '{namespace}'");
            store.replace(namespace, context);
        }
        store.save()
    }

    /// Drop every pending change. Equivalent to dropping the context.
    pub fn discard(self) {
        if !self.touched.is_empty() {
            debug!("Discarding {} touched naming context(s)", self.touched.len());
        }
    }
}

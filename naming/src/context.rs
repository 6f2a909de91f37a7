// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! One namespace of name-to-handle mappings.

use multi_index_map::MultiIndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::error;

/// Opaque device-assigned reference to a resource, e.g. an interface index.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Handle(u32);

impl Handle {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One live name-to-handle association.
#[derive(
    Clone, Debug, Deserialize, Eq, Hash, MultiIndexMap, Ord, PartialEq, PartialOrd, Serialize,
)]
#[multi_index_derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NamingEntry {
    #[multi_index(hashed_unique)]
    pub name: String,
    #[multi_index(ordered_unique)]
    pub handle: Handle,
}

/// The reasons a mapping may be rejected
#[derive(Debug, Error, PartialEq)]
pub enum NamingError {
    #[error("Name '{0}' is already mapped")]
    NameInUse(String),
    #[error("Handle {0} is already mapped")]
    HandleInUse(Handle),
}

/// Bijective name-to-handle map for one resource class.
///
/// Within a context, name-to-handle and handle-to-name are total bijections
/// over the live entries. Allocation is monotonic: a removed handle is never
/// handed out again for as long as the context lives.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NamingContext {
    entries: MultiIndexNamingEntryMap,
    next_handle: u32,
}

impl NamingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle mapped to `name`, allocating a fresh one on first use.
    pub fn get_or_allocate(&mut self, name: &str) -> Handle {
        if let Some(entry) = self.entries.get_by_name(&name.to_string()) {
            return entry.handle;
        }
        let handle = Handle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        match self.entries.try_insert(NamingEntry {
            name: name.to_string(),
            handle,
        }) {
            Ok(_) => {}
            Err(uniqueness_error) => {
                // unreachable: both indexes were just checked fresh
                error!("{uniqueness_error:?}");
            }
        }
        handle
    }

    /// Record an association discovered outside of allocation, e.g. device
    /// state found at startup. Keeps later allocations above `handle`.
    pub fn learn(&mut self, name: &str, handle: Handle) -> Result<(), NamingError> {
        if self.entries.get_by_name(&name.to_string()).is_some() {
            return Err(NamingError::NameInUse(name.to_string()));
        }
        if self.entries.get_by_handle(&handle).is_some() {
            return Err(NamingError::HandleInUse(handle));
        }
        match self.entries.try_insert(NamingEntry {
            name: name.to_string(),
            handle,
        }) {
            Ok(_) => {}
            Err(uniqueness_error) => {
                error!("{uniqueness_error:?}");
            }
        }
        self.next_handle = self.next_handle.max(handle.0.saturating_add(1));
        Ok(())
    }

    #[must_use]
    pub fn handle_of(&self, name: &str) -> Option<Handle> {
        self.entries
            .get_by_name(&name.to_string())
            .map(|entry| entry.handle)
    }

    #[must_use]
    pub fn name_of(&self, handle: Handle) -> Option<&str> {
        self.entries
            .get_by_handle(&handle)
            .map(|entry| entry.name.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.get_by_name(&name.to_string()).is_some()
    }

    /// Remove the association for `name`, returning its handle.
    pub fn remove(&mut self, name: &str) -> Option<Handle> {
        self.entries
            .remove_by_name(&name.to_string())
            .map(|entry| entry.handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &NamingEntry> {
        self.entries.iter_by_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn allocation_is_stable_and_bijective() {
        let mut ctx = NamingContext::new();
        let eth0 = ctx.get_or_allocate("eth0");
        let eth1 = ctx.get_or_allocate("eth1");
        assert_ne!(eth0, eth1);
        // repeated allocation returns the same handle
        assert_eq!(ctx.get_or_allocate("eth0"), eth0);
        assert_eq!(ctx.handle_of("eth0"), Some(eth0));
        assert_eq!(ctx.name_of(eth0), Some("eth0"));
        assert_eq!(ctx.name_of(eth1), Some("eth1"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn removed_handles_are_never_reused() {
        let mut ctx = NamingContext::new();
        let eth0 = ctx.get_or_allocate("eth0");
        assert_eq!(ctx.remove("eth0"), Some(eth0));
        assert!(!ctx.contains("eth0"));
        let again = ctx.get_or_allocate("eth0");
        assert_ne!(again, eth0);
        assert!(again.as_u32() > eth0.as_u32());
    }

    #[test]
    fn learn_keeps_allocation_monotonic() {
        let mut ctx = NamingContext::new();
        ctx.learn("loop0", Handle::new(41)).unwrap();
        assert!(ctx.get_or_allocate("eth0").as_u32() > 41);
        assert_eq!(
            ctx.learn("loop1", Handle::new(41)),
            Err(NamingError::HandleInUse(Handle::new(41)))
        );
        assert_eq!(
            ctx.learn("loop0", Handle::new(7)),
            Err(NamingError::NameInUse("loop0".to_string()))
        );
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Durable collection of naming contexts, keyed by namespace.

use crate::context::NamingContext;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// The reasons persisting or restoring the store may fail
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access naming store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode or decode naming store: {0}")]
    Codec(#[from] serde_yaml_ng::Error),
}

/// All naming contexts of one device, optionally backed by a file.
///
/// With a backing path, [`NamingStore::save`] rewrites the file so that a
/// restarted process resolves existing device state to the same symbolic
/// names it assigned before.
#[derive(Debug, Default)]
pub struct NamingStore {
    contexts: BTreeMap<String, NamingContext>,
    path: Option<PathBuf>,
}

impl NamingStore {
    /// Ephemeral store without persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store backed by `path`; a missing file yields an empty
    /// store on first boot.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contexts = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let contexts: BTreeMap<String, NamingContext> = serde_yaml_ng::from_str(&raw)?;
                info!(
                    "Restored {} naming context(s) from {}",
                    contexts.len(),
                    path.display()
                );
                contexts
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No naming store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(Self {
            contexts,
            path: Some(path),
        })
    }

    /// Persist all contexts. A store without a backing path is a no-op.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_yaml_ng::to_string(&self.contexts)?;
        std::fs::write(path, raw)?;
        debug!("Persisted naming store to {}", path.display());
        Ok(())
    }

    #[must_use]
    pub fn context(&self, namespace: &str) -> Option<&NamingContext> {
        self.contexts.get(namespace)
    }

    /// Context for `namespace`, created empty on first use.
    pub fn context_mut(&mut self, namespace: &str) -> &mut NamingContext {
        self.contexts.entry(namespace.to_string()).or_default()
    }

    /// Swap in a whole context; used when a mapping transaction commits.
    pub fn replace(&mut self, namespace: String, context: NamingContext) {
        self.contexts.insert(namespace, context);
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }
}

/// Store handle shared between the serialized writer and concurrent readers.
pub type SharedNamingStore = Arc<RwLock<NamingStore>>;

#[must_use]
pub fn shared(store: NamingStore) -> SharedNamingStore {
    Arc::new(RwLock::new(store))
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ordered, revertible whole-tree writer.
//!
//! The registry is assembled once at startup. Registration order is the
//! cross-scope precedence: creates and updates are dispatched in
//! registration order (register parents before children), deletes run first
//! and in reverse registration order, deepest node first. A batch either
//! applies completely or is reverted completely; the naming transaction
//! commits and rolls back with it.

use crate::context::WriteContext;
use crate::error::{CustomizerError, RegistryError, WriteError};
use crate::write::{NoopWriter, WriterCustomizer};
use model::{Identifier, Modification, ModificationBatch, NodeTypeId, Schema};
use naming::SharedNamingStore;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, error, warn};

struct WriterEntry {
    ty: NodeTypeId,
    namespace: Option<String>,
    customizer: Box<dyn WriterCustomizer>,
}

/// Collects writer registrations and validates total, conflict-free
/// coverage of the schema.
pub struct WriterRegistryBuilder {
    schema: Arc<Schema>,
    store: SharedNamingStore,
    entries: Vec<WriterEntry>,
    owner: Vec<Option<usize>>,
}

impl WriterRegistryBuilder {
    #[must_use]
    pub fn new(schema: Arc<Schema>, store: SharedNamingStore) -> Self {
        let owner = vec![None; schema.node_count()];
        Self {
            schema,
            store,
            entries: Vec::new(),
            owner,
        }
    }

    fn claim(&mut self, ty: NodeTypeId, index: usize) -> Result<(), RegistryError> {
        let slot = &mut self.owner[ty.index()];
        if slot.is_some() {
            return Err(RegistryError::AlreadyRegistered(
                self.schema.name(ty).to_string(),
            ));
        }
        *slot = Some(index);
        Ok(())
    }

    /// Register the writer for one node type.
    pub fn add(
        &mut self,
        ty: NodeTypeId,
        customizer: Box<dyn WriterCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        let index = self.entries.len();
        self.claim(ty, index)?;
        self.entries.push(WriterEntry {
            ty,
            namespace: None,
            customizer,
        });
        Ok(self)
    }

    /// Register the writer for a list whose entries are named device
    /// resources. The registry guards creates and deletes against the
    /// naming context of `namespace`.
    pub fn add_named_list(
        &mut self,
        ty: NodeTypeId,
        namespace: &str,
        customizer: Box<dyn WriterCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        if !self.schema.is_list(ty) {
            return Err(RegistryError::NotAList(self.schema.name(ty).to_string()));
        }
        let index = self.entries.len();
        self.claim(ty, index)?;
        self.entries.push(WriterEntry {
            ty,
            namespace: Some(namespace.to_string()),
            customizer,
        });
        Ok(self)
    }

    /// Register a no-op writer for a structural container.
    pub fn add_noop(&mut self, ty: NodeTypeId) -> Result<&mut Self, RegistryError> {
        self.add(ty, Box::new(NoopWriter))
    }

    /// Register one writer governing `ty` and the given descendant node
    /// types; modifications for any of them dispatch to this customizer.
    pub fn subtree_add(
        &mut self,
        ty: NodeTypeId,
        governed: &[NodeTypeId],
        customizer: Box<dyn WriterCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        for node in governed {
            if !is_descendant(&self.schema, ty, *node) {
                return Err(RegistryError::NotADescendant {
                    root: self.schema.name(ty).to_string(),
                    governed: self.schema.name(*node).to_string(),
                });
            }
        }
        let index = self.entries.len();
        self.claim(ty, index)?;
        for node in governed {
            self.claim(*node, index)?;
        }
        self.entries.push(WriterEntry {
            ty,
            namespace: None,
            customizer,
        });
        Ok(self)
    }

    /// Validate full coverage and produce the registry.
    pub fn build(self) -> Result<WriterRegistry, RegistryError> {
        let mut owner = Vec::with_capacity(self.owner.len());
        for ty in self.schema.types() {
            match self.owner[ty.index()] {
                Some(index) => owner.push(index),
                None => {
                    return Err(RegistryError::MissingWriter(
                        self.schema.name(ty).to_string(),
                    ));
                }
            }
        }
        debug!(
            "Writer registry covers {} node type(s) with {} registration(s)",
            owner.len(),
            self.entries.len()
        );
        Ok(WriterRegistry {
            schema: self.schema,
            store: self.store,
            entries: self.entries,
            owner,
        })
    }
}

fn is_descendant(schema: &Schema, root: NodeTypeId, node: NodeTypeId) -> bool {
    let mut cursor = schema.parent(node);
    while let Some(ty) = cursor {
        if ty == root {
            return true;
        }
        cursor = schema.parent(ty);
    }
    false
}

/// Applies modification batches to the device with all-or-nothing
/// semantics.
///
/// `update` takes `&mut self`: at most one batch is in flight at a time,
/// and the borrow checker enforces it.
pub struct WriterRegistry {
    schema: Arc<Schema>,
    store: SharedNamingStore,
    entries: Vec<WriterEntry>,
    owner: Vec<usize>,
}

impl WriterRegistry {
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Apply one batch. On failure every already-applied modification is
    /// reverted in reverse order and the naming transaction is discarded;
    /// on success the naming transaction commits and persists.
    pub fn update(&mut self, batch: &ModificationBatch) -> Result<(), WriteError> {
        if batch.is_empty() {
            debug!("Empty modification batch, nothing to apply");
            return Ok(());
        }
        let mut ctx = WriteContext::new(self.store.clone());
        let ordered = self.ordered(batch);
        let mut applied: Vec<Modification> = Vec::with_capacity(ordered.len());
        for m in ordered {
            match self.apply_one(m, &mut ctx) {
                Ok(resolved) => applied.push(resolved),
                Err(failure) => {
                    error!("Failed to apply modification for '{}': {failure}", m.id());
                    let revert_failure = self.revert(&applied, &mut ctx);
                    ctx.into_naming().discard();
                    return Err(match revert_failure {
                        None => failure,
                        Some((failed, cause)) => WriteError::RevertFailed {
                            original: Box::new(failure),
                            failed,
                            cause: Box::new(cause),
                        },
                    });
                }
            }
        }
        let count = applied.len();
        ctx.into_naming().commit()?;
        debug!("Successfully applied {count} modification(s)");
        Ok(())
    }

    /// Deletes first in reverse registration order (children before
    /// parents), then creates and updates in registration order.
    fn ordered<'a>(&self, batch: &'a ModificationBatch) -> Vec<&'a Modification> {
        let mut deletes: Vec<&Modification> = Vec::new();
        let mut writes: Vec<&Modification> = Vec::new();
        for m in batch {
            if m.is_delete() {
                deletes.push(m);
            } else {
                writes.push(m);
            }
        }
        deletes.sort_by_key(|m| (Reverse(self.owner_of(m)), Reverse(m.id().depth())));
        writes.sort_by_key(|m| (self.owner_of(m), m.id().depth()));
        deletes.into_iter().chain(writes).collect()
    }

    fn owner_of(&self, m: &Modification) -> usize {
        self.owner[m.id().target_type().index()]
    }

    /// Dispatch one modification, returning it with its identifier made
    /// concrete so the inverse is exact on revert.
    fn apply_one(
        &self,
        m: &Modification,
        ctx: &mut WriteContext,
    ) -> Result<Modification, WriteError> {
        let entry = &self.entries[self.owner_of(m)];
        let id = self.resolve_id(m)?;
        Self::check_mapping(entry, &id, m, ctx)?;
        match m {
            Modification::Create { data, .. } => {
                debug!("Creating '{id}'");
                entry
                    .customizer
                    .write_current(&id, data, ctx)
                    .map_err(|source| WriteError::CreateFailed {
                        id: id.clone(),
                        data: data.clone(),
                        source,
                    })?;
                Ok(Modification::Create {
                    id,
                    data: data.clone(),
                })
            }
            Modification::Update { before, after, .. } => {
                debug!("Updating '{id}'");
                entry
                    .customizer
                    .update_current(&id, before, after, ctx)
                    .map_err(|source| match source {
                        CustomizerError::UpdateUnsupported => {
                            WriteError::UnsupportedOperation(id.clone())
                        }
                        source => WriteError::UpdateFailed {
                            id: id.clone(),
                            before: before.clone(),
                            after: after.clone(),
                            source,
                        },
                    })?;
                Ok(Modification::Update {
                    id,
                    before: before.clone(),
                    after: after.clone(),
                })
            }
            Modification::Delete { before, .. } => {
                debug!("Deleting '{id}'");
                entry
                    .customizer
                    .delete_current(&id, before, ctx)
                    .map_err(|source| WriteError::DeleteFailed {
                        id: id.clone(),
                        before: before.clone(),
                        source,
                    })?;
                Ok(Modification::Delete {
                    id,
                    before: before.clone(),
                })
            }
        }
    }

    /// Substitute a wildcarded final list step with the payload key.
    fn resolve_id(&self, m: &Modification) -> Result<Identifier, WriteError> {
        let id = m.id();
        if !self.schema.is_list(id.target_type()) || id.target_key().is_some() {
            return Ok(id.clone());
        }
        match m.keyed_data().key() {
            Some(key) => Ok(id.clone().with_target_key(key.clone())),
            None => Err(WriteError::MissingKey(id.clone())),
        }
    }

    /// Guard named resources against duplicate creates and dangling
    /// updates/deletes before any device call is made.
    fn check_mapping(
        entry: &WriterEntry,
        id: &Identifier,
        m: &Modification,
        ctx: &mut WriteContext,
    ) -> Result<(), WriteError> {
        let Some(namespace) = &entry.namespace else {
            return Ok(());
        };
        if id.target_type() != entry.ty {
            // subtree child of the named list; the entry itself is guarded
            return Ok(());
        }
        let Some(name) = id.target_key() else {
            return Err(WriteError::MissingKey(id.clone()));
        };
        let mapped = ctx.naming().contains(namespace, name.as_str());
        match m {
            Modification::Create { .. } if mapped => Err(WriteError::DuplicateCreate(id.clone())),
            Modification::Update { .. } | Modification::Delete { .. } if !mapped => {
                Err(WriteError::NotFound(id.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Undo already-applied modifications in reverse order. Returns the
    /// first revert failure, if any; the caller reports it on top of the
    /// original error.
    fn revert(
        &self,
        applied: &[Modification],
        ctx: &mut WriteContext,
    ) -> Option<(Identifier, WriteError)> {
        if applied.is_empty() {
            return None;
        }
        warn!("Reverting {} already applied modification(s)", applied.len());
        for m in applied.iter().rev() {
            let inverse = m.inverse();
            if let Err(cause) = self.apply_one(&inverse, ctx) {
                error!(
                    "Fatal: revert of '{}' failed, device and intended state diverged: {cause}",
                    inverse.id()
                );
                return Some((inverse.id().clone(), cause));
            }
        }
        None
    }
}

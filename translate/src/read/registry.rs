// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Recursive whole-tree reader.
//!
//! `read` rebuilds the payload of one node from device state by invoking
//! its reader customizer and recursing over every registered child type,
//! merging results bottom-up. One read context (one naming snapshot, one
//! dump cache) spans the whole call, so the result reflects a single device
//! snapshot.

use crate::context::ReadContext;
use crate::error::{ReadError, RegistryError};
use crate::read::{ListReaderCustomizer, ReaderCustomizer};
use model::{DataObject, Identifier, NodeTypeId, Schema};
use naming::SharedNamingStore;
use std::sync::Arc;
use tracing::{debug, trace};

enum ReaderKind {
    Node(Box<dyn ReaderCustomizer>),
    List(Box<dyn ListReaderCustomizer>),
    Structural,
}

struct ReaderEntry {
    ty: NodeTypeId,
    kind: ReaderKind,
}

/// Collects reader registrations and validates total, conflict-free
/// coverage of the schema.
pub struct ReaderRegistryBuilder {
    schema: Arc<Schema>,
    store: SharedNamingStore,
    entries: Vec<ReaderEntry>,
    owner: Vec<Option<usize>>,
}

impl ReaderRegistryBuilder {
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

    /// Register the reader for one container node type.
    pub fn add(
        &mut self,
        ty: NodeTypeId,
        customizer: Box<dyn ReaderCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        if self.schema.is_list(ty) {
            return Err(RegistryError::ListReaderRequired(
                self.schema.name(ty).to_string(),
            ));
        }
        let index = self.entries.len();
        self.claim(ty, index)?;
        self.entries.push(ReaderEntry {
            ty,
            kind: ReaderKind::Node(customizer),
        });
        Ok(self)
    }

    /// Register the reader for a keyed list node type.
    pub fn add_list(
        &mut self,
        ty: NodeTypeId,
        customizer: Box<dyn ListReaderCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        if !self.schema.is_list(ty) {
            return Err(RegistryError::NotAList(self.schema.name(ty).to_string()));
        }
        let index = self.entries.len();
        self.claim(ty, index)?;
        self.entries.push(ReaderEntry {
            ty,
            kind: ReaderKind::List(customizer),
        });
        Ok(self)
    }

    /// Register a structural reader: the container has no device
    /// representation of its own and is present exactly when child reads
    /// put content into it.
    pub fn add_structural(&mut self, ty: NodeTypeId) -> Result<&mut Self, RegistryError> {
        if self.schema.is_list(ty) {
            return Err(RegistryError::ListReaderRequired(
                self.schema.name(ty).to_string(),
            ));
        }
        let index = self.entries.len();
        self.claim(ty, index)?;
        self.entries.push(ReaderEntry {
            ty,
            kind: ReaderKind::Structural,
        });
        Ok(self)
    }

    /// Register one reader governing `ty` and the given descendant node
    /// types; the customizer returns the whole subtree payload and the
    /// registry does not recurse into the governed children.
    pub fn subtree_add(
        &mut self,
        ty: NodeTypeId,
        governed: &[NodeTypeId],
        customizer: Box<dyn ReaderCustomizer>,
    ) -> Result<&mut Self, RegistryError> {
        if self.schema.is_list(ty) {
            return Err(RegistryError::ListReaderRequired(
                self.schema.name(ty).to_string(),
            ));
        }
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
        self.entries.push(ReaderEntry {
            ty,
            kind: ReaderKind::Node(customizer),
        });
        Ok(self)
    }

    /// Validate full coverage and produce the registry.
    pub fn build(self) -> Result<ReaderRegistry, RegistryError> {
        let mut owner = Vec::with_capacity(self.owner.len());
        for ty in self.schema.types() {
            match self.owner[ty.index()] {
                Some(index) => owner.push(index),
                None => {
                    return Err(RegistryError::MissingReader(
                        self.schema.name(ty).to_string(),
                    ));
                }
            }
        }
        debug!(
            "Reader registry covers {} node type(s) with {} registration(s)",
            owner.len(),
            self.entries.len()
        );
        Ok(ReaderRegistry {
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

/// Produces the current-state payload of any subtree of the model.
pub struct ReaderRegistry {
    schema: Arc<Schema>,
    store: SharedNamingStore,
    entries: Vec<ReaderEntry>,
    owner: Vec<usize>,
}

impl ReaderRegistry {
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current state of the node addressed by the concrete identifier
    /// `id`; `None` if it does not exist on the device.
    pub fn read(&self, id: &Identifier) -> Result<Option<DataObject>, ReadError> {
        if id.is_wildcarded() {
            return Err(ReadError::WildcardedRead(id.clone()));
        }
        let mut ctx = ReadContext::new(self.store.clone());
        self.read_node(id, &mut ctx)
    }

    /// Current state of every entry of the wildcarded list `id`.
    pub fn read_list(&self, id: &Identifier) -> Result<Vec<DataObject>, ReadError> {
        if !self.schema.is_list(id.target_type()) || id.target_key().is_some() {
            return Err(ReadError::NotAList(id.clone()));
        }
        if id.parent().is_some_and(|parent| parent.is_wildcarded()) {
            return Err(ReadError::WildcardedRead(id.clone()));
        }
        let mut ctx = ReadContext::new(self.store.clone());
        let mut result = Vec::new();
        self.read_list_into(id, &mut ctx, &mut result)?;
        Ok(result)
    }

    /// Current state of the whole tree: every root container present on
    /// the device, read within one consistent snapshot.
    pub fn read_all(&self) -> Result<Vec<DataObject>, ReadError> {
        let mut ctx = ReadContext::new(self.store.clone());
        let mut result = Vec::new();
        for root in self.schema.roots() {
            let id = Identifier::typed(&self.schema, *root);
            if self.schema.is_list(*root) {
                self.read_list_into(&id, &mut ctx, &mut result)?;
            } else if let Some(node) = self.read_node(&id, &mut ctx)? {
                result.push(node);
            }
        }
        Ok(result)
    }

    fn read_list_into(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
        out: &mut Vec<DataObject>,
    ) -> Result<(), ReadError> {
        let entry = &self.entries[self.owner[id.target_type().index()]];
        let ReaderKind::List(customizer) = &entry.kind else {
            return Err(ReadError::NotAList(id.clone()));
        };
        let keys = customizer
            .read_all_keys(id, ctx)
            .map_err(|source| ReadError::ReadFailed {
                id: id.clone(),
                source,
            })?;
        trace!("'{id}' has {} entr(ies) on the device", keys.len());
        for key in keys {
            if let Some(node) = self.read_node(&id.clone().with_target_key(key), ctx)? {
                out.push(node);
            }
        }
        Ok(())
    }

    fn read_node(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, ReadError> {
        let target = id.target_type();
        let entry_index = self.owner[target.index()];
        let entry = &self.entries[entry_index];
        let current = match &entry.kind {
            ReaderKind::Structural => Some(DataObject::container(target)),
            ReaderKind::Node(customizer) => {
                customizer
                    .read_current(id, ctx)
                    .map_err(|source| ReadError::ReadFailed {
                        id: id.clone(),
                        source,
                    })?
            }
            ReaderKind::List(customizer) => {
                customizer
                    .read_current(id, ctx)
                    .map_err(|source| ReadError::ReadFailed {
                        id: id.clone(),
                        source,
                    })?
            }
        };
        let Some(mut node) = current else {
            return Ok(None);
        };
        for child_ty in self.schema.children(target) {
            if self.owner[child_ty.index()] == entry_index {
                // governed by this node's subtree registration, already
                // embedded in its payload
                continue;
            }
            self.read_children_into(&mut node, id, *child_ty, ctx)?;
        }
        if matches!(entry.kind, ReaderKind::Structural) && node.is_empty() {
            return Ok(None);
        }
        Ok(Some(node))
    }

    fn read_children_into(
        &self,
        parent: &mut DataObject,
        parent_id: &Identifier,
        child_ty: NodeTypeId,
        ctx: &mut ReadContext,
    ) -> Result<(), ReadError> {
        let child_entry = &self.entries[self.owner[child_ty.index()]];
        if self.schema.is_list(child_ty) {
            let ReaderKind::List(customizer) = &child_entry.kind else {
                // builder guarantees lists resolve to list readers
                return Ok(());
            };
            let wild = parent_id.child(&self.schema, child_ty);
            let keys =
                customizer
                    .read_all_keys(&wild, ctx)
                    .map_err(|source| ReadError::ReadFailed {
                        id: wild.clone(),
                        source,
                    })?;
            for key in keys {
                let child_id = parent_id.child_keyed(&self.schema, child_ty, key);
                if let Some(child) = self.read_node(&child_id, ctx)? {
                    customizer.merge(parent, child);
                }
            }
        } else {
            let child_id = parent_id.child(&self.schema, child_ty);
            if let Some(child) = self.read_node(&child_id, ctx)? {
                match &child_entry.kind {
                    ReaderKind::Node(customizer) => customizer.merge(parent, child),
                    ReaderKind::List(customizer) => customizer.merge(parent, child),
                    ReaderKind::Structural => parent.push_child(child),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CustomizerError;
    use model::SchemaBuilder;
    use naming::{NamingStore, store::shared};
    use pretty_assertions::assert_eq;

    struct EmptyDevice;

    impl ReaderCustomizer for EmptyDevice {
        fn read_current(
            &self,
            _id: &Identifier,
            _ctx: &mut ReadContext,
        ) -> Result<Option<DataObject>, CustomizerError> {
            Ok(None)
        }
    }

    fn schema() -> (Arc<Schema>, NodeTypeId, NodeTypeId) {
        let mut builder = SchemaBuilder::new();
        let interfaces = builder.container("interfaces", None).unwrap();
        let interface = builder.list("interface", Some(interfaces)).unwrap();
        (Arc::new(builder.build()), interfaces, interface)
    }

    #[test]
    fn uncovered_node_type_fails_at_build() {
        let (schema, interfaces, _) = schema();
        let mut builder = ReaderRegistryBuilder::new(schema, shared(NamingStore::in_memory()));
        builder.add_structural(interfaces).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(RegistryError::MissingReader("interface".to_string()))
        );
    }

    #[test]
    fn lists_require_list_readers() {
        let (schema, _, interface) = schema();
        let mut builder = ReaderRegistryBuilder::new(schema, shared(NamingStore::in_memory()));
        assert_eq!(
            builder.add(interface, Box::new(EmptyDevice)).err(),
            Some(RegistryError::ListReaderRequired("interface".to_string()))
        );
        assert_eq!(
            builder.add_structural(interface).err(),
            Some(RegistryError::ListReaderRequired("interface".to_string()))
        );
    }

    #[test]
    fn structural_container_without_content_reads_absent() {
        let mut builder = SchemaBuilder::new();
        let interfaces = builder.container("interfaces", None).unwrap();
        let state = builder.container("state", Some(interfaces)).unwrap();
        let schema = Arc::new(builder.build());

        let mut registry =
            ReaderRegistryBuilder::new(schema.clone(), shared(NamingStore::in_memory()));
        registry.add_structural(interfaces).unwrap();
        registry.add(state, Box::new(EmptyDevice)).unwrap();
        let registry = registry.build().unwrap();

        let id = Identifier::typed(&schema, interfaces);
        assert_eq!(registry.read(&id).unwrap(), None);
        assert_eq!(registry.read_all().unwrap(), vec![]);
    }
}

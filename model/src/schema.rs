// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Node-type schema: the set of node types a device model is made of.
//!
//! The schema is built once at startup and is immutable afterwards. Every node
//! type occupies exactly one position in the tree, so a [`NodeTypeId`] alone
//! determines the full path from the root.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Index of a node type within its [`Schema`].
///
/// Ids are only meaningful together with the schema that minted them.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct NodeTypeId(u16);

impl NodeTypeId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl Display for NodeTypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node type is a plain container or a keyed list.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeKind {
    Container,
    List,
}

#[derive(Clone, Debug)]
struct SchemaNode {
    name: Arc<str>,
    kind: NodeKind,
    parent: Option<NodeTypeId>,
    children: Vec<NodeTypeId>,
}

/// The reasons a schema may be rejected while it is being declared
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("A node named '{0}' already exists under the same parent")]
    DuplicateName(String),
    #[error("Unknown parent node type {0}")]
    UnknownParent(NodeTypeId),
    #[error("Schema node limit reached")]
    TooManyNodes,
}

/// Immutable node-type table for one device model.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeTypeId>,
}

impl Schema {
    #[must_use]
    pub fn name(&self, ty: NodeTypeId) -> &str {
        &self.nodes[ty.index()].name
    }

    #[must_use]
    pub(crate) fn name_arc(&self, ty: NodeTypeId) -> Arc<str> {
        self.nodes[ty.index()].name.clone()
    }

    #[must_use]
    pub fn kind(&self, ty: NodeTypeId) -> NodeKind {
        self.nodes[ty.index()].kind
    }

    #[must_use]
    pub fn is_list(&self, ty: NodeTypeId) -> bool {
        self.nodes[ty.index()].kind == NodeKind::List
    }

    #[must_use]
    pub fn parent(&self, ty: NodeTypeId) -> Option<NodeTypeId> {
        self.nodes[ty.index()].parent
    }

    #[must_use]
    pub fn children(&self, ty: NodeTypeId) -> &[NodeTypeId] {
        &self.nodes[ty.index()].children
    }

    /// Node types with no parent, in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeTypeId] {
        &self.roots
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node type ids, in declaration order.
    pub fn types(&self) -> impl Iterator<Item = NodeTypeId> {
        // the builder caps the node count at u16::MAX
        let count = u16::try_from(self.nodes.len()).unwrap_or(u16::MAX);
        (0..count).map(NodeTypeId)
    }

    /// Path of node types from the root down to (and including) `ty`.
    #[must_use]
    pub fn path(&self, ty: NodeTypeId) -> Vec<NodeTypeId> {
        let mut path = vec![ty];
        let mut cursor = ty;
        while let Some(parent) = self.parent(cursor) {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        path
    }
}

/// Declares the node types of a device model and produces a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeTypeId>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a container node type.
    pub fn container(
        &mut self,
        name: &str,
        parent: Option<NodeTypeId>,
    ) -> Result<NodeTypeId, SchemaError> {
        self.add(name, NodeKind::Container, parent)
    }

    /// Declare a keyed list node type.
    pub fn list(
        &mut self,
        name: &str,
        parent: Option<NodeTypeId>,
    ) -> Result<NodeTypeId, SchemaError> {
        self.add(name, NodeKind::List, parent)
    }

    fn add(
        &mut self,
        name: &str,
        kind: NodeKind,
        parent: Option<NodeTypeId>,
    ) -> Result<NodeTypeId, SchemaError> {
        let id = NodeTypeId(
            u16::try_from(self.nodes.len()).map_err(|_| SchemaError::TooManyNodes)?,
        );
        let siblings = match parent {
            Some(parent) => {
                let Some(node) = self.nodes.get(parent.index()) else {
                    return Err(SchemaError::UnknownParent(parent));
                };
                &node.children
            }
            None => &self.roots,
        };
        if siblings
            .iter()
            .any(|sibling| &*self.nodes[sibling.index()].name == name)
        {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        self.nodes.push(SchemaNode {
            name: Arc::from(name),
            kind,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn path_follows_parent_chain() {
        let mut builder = SchemaBuilder::new();
        let interfaces = builder.container("interfaces", None).unwrap();
        let interface = builder.list("interface", Some(interfaces)).unwrap();
        let ipv4 = builder.container("ipv4", Some(interface)).unwrap();
        let schema = builder.build();

        assert_eq!(schema.path(ipv4), vec![interfaces, interface, ipv4]);
        assert_eq!(schema.children(interfaces), &[interface]);
        assert_eq!(schema.roots(), &[interfaces]);
        assert!(schema.is_list(interface));
        assert!(!schema.is_list(ipv4));
    }

    #[test]
    fn sibling_names_must_be_unique() {
        let mut builder = SchemaBuilder::new();
        let interfaces = builder.container("interfaces", None).unwrap();
        builder.list("interface", Some(interfaces)).unwrap();
        assert_eq!(
            builder.list("interface", Some(interfaces)),
            Err(SchemaError::DuplicateName("interface".to_string()))
        );
        // the same name under a different parent is fine
        let bridges = builder.container("bridge-domains", None).unwrap();
        assert!(builder.list("interface", Some(bridges)).is_ok());
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut first = SchemaBuilder::new();
        let interfaces = first.container("interfaces", None).unwrap();
        let interface = first.list("interface", Some(interfaces)).unwrap();
        let _ = first.build();

        let mut second = SchemaBuilder::new();
        assert_eq!(
            second.container("mtu", Some(interface)),
            Err(SchemaError::UnknownParent(interface))
        );
    }
}

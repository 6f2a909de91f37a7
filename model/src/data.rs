// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Opaque node payloads.
//!
//! A [`DataObject`] carries the attributes and children of one tree node. The
//! engine never interprets attributes; it only extracts the key of list
//! entries and merges child payloads into their parent when reading device
//! state bottom-up.

use crate::identifier::Key;
use crate::schema::NodeTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Scalar attribute value.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Num(u64),
    Text(String),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Num(u64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(value) => value.fmt(f),
            Value::Num(value) => value.fmt(f),
            Value::Text(value) => value.fmt(f),
        }
    }
}

/// Immutable payload of one tree node: attributes plus child payloads.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DataObject {
    ty: NodeTypeId,
    key: Option<Key>,
    attrs: BTreeMap<String, Value>,
    children: Vec<DataObject>,
}

impl DataObject {
    /// Payload for a container node.
    #[must_use]
    pub fn container(ty: NodeTypeId) -> Self {
        Self {
            ty,
            key: None,
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Payload for one entry of a keyed list.
    #[must_use]
    pub fn list_entry(ty: NodeTypeId, key: impl Into<Key>) -> Self {
        Self {
            ty,
            key: Some(key.into()),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn node_type(&self) -> NodeTypeId {
        self.ty
    }

    /// Key of a list entry payload; `None` for containers.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn with_child(mut self, child: DataObject) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, child: DataObject) {
        self.children.push(child);
    }

    #[must_use]
    pub fn children(&self) -> &[DataObject] {
        &self.children
    }

    /// First child of the given type, if any.
    #[must_use]
    pub fn child_of_type(&self, ty: NodeTypeId) -> Option<&DataObject> {
        self.children.iter().find(|child| child.ty == ty)
    }

    /// Child list entry of the given type and key, if any.
    #[must_use]
    pub fn child_keyed(&self, ty: NodeTypeId, key: &Key) -> Option<&DataObject> {
        self.children
            .iter()
            .find(|child| child.ty == ty && child.key() == Some(key))
    }

    pub fn children_of_type(&self, ty: NodeTypeId) -> impl Iterator<Item = &DataObject> {
        self.children.iter().filter(move |child| child.ty == ty)
    }

    /// True if the payload has neither attributes nor children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }
}

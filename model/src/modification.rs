// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Node-level tree modifications.
//!
//! A [`Modification`] describes one requested change between two tree
//! snapshots. The three shapes make the invalid "neither previous nor next
//! payload" case unrepresentable. A [`ModificationBatch`] is the unit the
//! writer registry applies atomically.

use crate::data::DataObject;
use crate::identifier::Identifier;
use std::collections::HashSet;
use thiserror::Error;

/// One create, update or delete against a single tree node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Modification {
    Create {
        id: Identifier,
        data: DataObject,
    },
    Update {
        id: Identifier,
        before: DataObject,
        after: DataObject,
    },
    Delete {
        id: Identifier,
        before: DataObject,
    },
}

impl Modification {
    #[must_use]
    pub fn id(&self) -> &Identifier {
        match self {
            Modification::Create { id, .. }
            | Modification::Update { id, .. }
            | Modification::Delete { id, .. } => id,
        }
    }

    /// The payload carrying the list key: next state for creates and
    /// updates, previous state for deletes.
    #[must_use]
    pub fn keyed_data(&self) -> &DataObject {
        match self {
            Modification::Create { data, .. } => data,
            Modification::Update { before, .. } | Modification::Delete { before, .. } => before,
        }
    }

    /// The modification that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Modification {
        match self {
            Modification::Create { id, data } => Modification::Delete {
                id: id.clone(),
                before: data.clone(),
            },
            Modification::Update { id, before, after } => Modification::Update {
                id: id.clone(),
                before: after.clone(),
                after: before.clone(),
            },
            Modification::Delete { id, before } => Modification::Create {
                id: id.clone(),
                data: before.clone(),
            },
        }
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Modification::Delete { .. })
    }

    /// The concrete identifier this modification dispatches under: a
    /// wildcarded final list step takes its key from the payload.
    #[must_use]
    pub fn effective_id(&self) -> Identifier {
        let id = self.id();
        match (id.target().is_wildcarded(), self.keyed_data().key()) {
            (true, Some(key)) => id.clone().with_target_key(key.clone()),
            _ => id.clone(),
        }
    }
}

/// The reasons a batch may be rejected before anything is applied
#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("Modification for '{0}' appears more than once in the batch")]
    DuplicateIdentifier(Identifier),
    #[error("Payload key '{data_key}' contradicts identifier '{id}'")]
    KeyMismatch { id: Identifier, data_key: String },
}

/// Validated set of modifications, applied as one all-or-nothing unit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModificationBatch {
    mods: Vec<Modification>,
}

impl ModificationBatch {
    /// Validate and wrap a set of modifications.
    ///
    /// Rejects identifier collisions (after wildcard resolution) and list
    /// payloads whose key contradicts an already-keyed identifier.
    pub fn new(mods: Vec<Modification>) -> Result<Self, BatchError> {
        let mut seen = HashSet::with_capacity(mods.len());
        for m in &mods {
            if let (Some(id_key), Some(data_key)) = (m.id().target_key(), m.keyed_data().key()) {
                if id_key != data_key {
                    return Err(BatchError::KeyMismatch {
                        id: m.id().clone(),
                        data_key: data_key.to_string(),
                    });
                }
            }
            let effective = m.effective_id();
            if !seen.insert(effective.clone()) {
                return Err(BatchError::DuplicateIdentifier(effective));
            }
        }
        Ok(Self { mods })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modification> {
        self.mods.iter()
    }

    /// The batch that undoes this one: inverse members in reverse order.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            mods: self.mods.iter().rev().map(Modification::inverse).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ModificationBatch {
    type Item = &'a Modification;
    type IntoIter = std::slice::Iter<'a, Modification>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}

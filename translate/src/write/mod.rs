// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Writer side of the translation engine.

pub mod registry;

use crate::context::WriteContext;
use crate::error::CustomizerError;
use model::{DataObject, Identifier};

/// Per-node-type translation of tree modifications into device operations.
///
/// Implementations receive concrete identifiers: a wildcarded list
/// identifier has its key substituted from the payload before dispatch.
/// The default `update_current` refuses in-place updates; the registry
/// surfaces that as an unsupported-operation failure instead of silently
/// reordering the update into delete plus create.
pub trait WriterCustomizer: Send {
    /// For nodes layered on a parent payload: pull this node's payload out
    /// of the parent's. Front ends that deliver parent-granularity changes
    /// use this to derive node-level modifications.
    fn extract<'a>(&self, id: &Identifier, parent: &'a DataObject) -> Option<&'a DataObject> {
        parent.child_of_type(id.target_type())
    }

    /// Create the node on the device.
    fn write_current(
        &self,
        id: &Identifier,
        data: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError>;

    /// Update the node in place.
    fn update_current(
        &self,
        id: &Identifier,
        before: &DataObject,
        after: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let _ = (id, before, after, ctx);
        Err(CustomizerError::UpdateUnsupported)
    }

    /// Delete the node from the device.
    fn delete_current(
        &self,
        id: &Identifier,
        before: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError>;
}

/// Writer for structural containers that have no device representation of
/// their own; their content is handled by child registrations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWriter;

impl WriterCustomizer for NoopWriter {
    fn write_current(
        &self,
        _id: &Identifier,
        _data: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        Ok(())
    }

    fn update_current(
        &self,
        _id: &Identifier,
        _before: &DataObject,
        _after: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        Ok(())
    }

    fn delete_current(
        &self,
        _id: &Identifier,
        _before: &DataObject,
        _ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        Ok(())
    }
}

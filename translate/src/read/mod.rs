// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reader side of the translation engine.

pub mod registry;

use crate::context::ReadContext;
use crate::error::CustomizerError;
use model::{DataObject, Identifier, Key};

/// Per-node-type reconstruction of tree payloads from device state.
///
/// Readers may be invoked from concurrent read sessions, hence `Sync`.
pub trait ReaderCustomizer: Send + Sync {
    /// Read the node addressed by `id` from the device; `None` if it does
    /// not exist there.
    fn read_current(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError>;

    /// Attach a fully-read child payload to its parent. The default places
    /// it as a plain child node.
    fn merge(&self, parent: &mut DataObject, child: DataObject) {
        parent.push_child(child);
    }
}

/// Reader for keyed lists: additionally enumerates the entries present on
/// the device, so a wildcarded identifier can fan out per key.
pub trait ListReaderCustomizer: ReaderCustomizer {
    /// Keys of all entries currently present on the device.
    fn read_all_keys(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<Key>, CustomizerError>;
}

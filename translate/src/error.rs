// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Failure taxonomy of the translation engine.

use model::{DataObject, Identifier};
use naming::StoreError;
use thiserror::Error;

/// Failure reported by one customizer invocation.
///
/// Device-reported errors and transport timeouts both surface as
/// [`CustomizerError::Device`]; the engine treats them uniformly and never
/// retries on its own.
#[derive(Debug, Error)]
pub enum CustomizerError {
    #[error("Device operation failed: {0}")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("In-place update is not supported")]
    UpdateUnsupported,
}

impl CustomizerError {
    pub fn device(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Device(Box::new(err))
    }
}

/// The reasons a registry may be rejected while it is being built
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("No writer registered covering node type '{0}'")]
    MissingWriter(String),
    #[error("No reader registered covering node type '{0}'")]
    MissingReader(String),
    #[error("Node type '{0}' is already covered by another registration")]
    AlreadyRegistered(String),
    #[error("'{0}' is not a list node type")]
    NotAList(String),
    #[error("'{0}' is a list node type and needs a list reader")]
    ListReaderRequired(String),
    #[error("Subtree registration for '{root}' must govern descendants, '{governed}' is not one")]
    NotADescendant { root: String, governed: String },
}

/// The reasons applying a modification batch may fail.
///
/// Local invariant violations (`NotFound`, `DuplicateCreate`, `MissingKey`)
/// are detected before any device call. `RevertFailed` is the only
/// unrecoverable case: the device and the intended state have diverged and
/// an operator needs to look at it.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create '{id}'")]
    CreateFailed {
        id: Identifier,
        data: DataObject,
        #[source]
        source: CustomizerError,
    },
    #[error("Failed to update '{id}'")]
    UpdateFailed {
        id: Identifier,
        before: DataObject,
        after: DataObject,
        #[source]
        source: CustomizerError,
    },
    #[error("Failed to delete '{id}'")]
    DeleteFailed {
        id: Identifier,
        before: DataObject,
        #[source]
        source: CustomizerError,
    },
    #[error("In-place update of '{0}' is not supported")]
    UnsupportedOperation(Identifier),
    #[error("No mapping found for '{0}'")]
    NotFound(Identifier),
    #[error("'{0}' is already mapped, refusing duplicate create")]
    DuplicateCreate(Identifier),
    #[error("List payload for '{0}' carries no key")]
    MissingKey(Identifier),
    #[error("Revert failed at '{failed}' while recovering from: {original}")]
    RevertFailed {
        original: Box<WriteError>,
        failed: Identifier,
        #[source]
        cause: Box<WriteError>,
    },
    #[error("Failed to commit naming mappings: {0}")]
    CommitFailed(#[from] StoreError),
}

impl WriteError {
    /// The first failure of the batch, unwrapping a failed revert.
    #[must_use]
    pub fn original(&self) -> &WriteError {
        match self {
            WriteError::RevertFailed { original, .. } => original,
            other => other,
        }
    }
}

/// The reasons reading device state may fail
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read '{id}'")]
    ReadFailed {
        id: Identifier,
        #[source]
        source: CustomizerError,
    },
    #[error("'{0}' is wildcarded and addresses a whole list")]
    WildcardedRead(Identifier),
    #[error("'{0}' does not address a list")]
    NotAList(Identifier),
}

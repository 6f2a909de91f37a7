// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration tree model for the translation engine.
//!
//! A device configuration is modeled as a tree of typed nodes. The `Schema`
//! describes the node types and their positions; an `Identifier` addresses one
//! node (or a whole class of list entries, when wildcarded); a `DataObject` is
//! the opaque payload attached to a node; a `Modification` is one requested
//! change against a pair of tree snapshots. The engine in the translate crate
//! consumes these types and never looks inside a payload except to extract
//! list keys.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod data;
pub mod identifier;
pub mod modification;
pub mod schema;

pub use data::{DataObject, Value}; // re-export
pub use identifier::{Identifier, Key, PathStep}; // re-export
pub use modification::{BatchError, Modification, ModificationBatch}; // re-export
pub use schema::{NodeKind, NodeTypeId, Schema, SchemaBuilder, SchemaError}; // re-export

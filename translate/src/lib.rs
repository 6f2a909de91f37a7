// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Translation engine between the modeled configuration tree and device
//! operations.
//!
//! Per-node-type behavior is supplied by customizers: a writer customizer
//! turns create/update/delete modifications into device calls, a reader
//! customizer rebuilds the payload of a node from current device state. The
//! registries compose customizers into a whole-tree writer with
//! all-or-nothing batch semantics and a whole-tree recursive reader. Both
//! are built once at startup against a schema and fail fast unless every
//! node type is covered by exactly one registration.

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

pub mod context;
pub mod error;
pub mod read;
pub mod write;

pub use context::{DumpCache, ReadContext, WriteContext}; // re-export
pub use error::{CustomizerError, ReadError, RegistryError, WriteError}; // re-export
pub use read::registry::{ReaderRegistry, ReaderRegistryBuilder}; // re-export
pub use read::{ListReaderCustomizer, ReaderCustomizer}; // re-export
pub use write::registry::{WriterRegistry, WriterRegistryBuilder}; // re-export
pub use write::{NoopWriter, WriterCustomizer}; // re-export

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Symbolic-name to device-handle mapping.
//!
//! The device addresses its resources by compact opaque handles; the
//! configuration model addresses them by human-readable names. Each managed
//! resource class gets one [`NamingContext`]: a bijective name-to-handle map
//! with monotonic allocation. Contexts live in a durable [`NamingStore`] so
//! names survive process restarts, and all lookups and writes made while a
//! configuration change is being applied go through a transactional
//! [`MappingContext`] that commits or discards together with the change.

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
#![allow(clippy::unsafe_derive_deserialize)] // generated code uses unsafe

pub mod context;
pub mod mapping;
pub mod store;

pub use context::{Handle, NamingContext, NamingEntry, NamingError}; // re-export
pub use mapping::MappingContext; // re-export
pub use store::{NamingStore, SharedNamingStore, StoreError}; // re-export

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration management entry point.
//!
//! The processor owns the writer registry and serializes modification
//! batches arriving from northbound front ends; reads go straight to the
//! shared reader registry and may run concurrently.

/* Configuration processor */
pub mod processor;

pub use processor::{
    ConfigService, ProcessorError, ProcessorParams, ProcessorParamsBuilder, start_processor,
}; // re-export

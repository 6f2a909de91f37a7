// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Testing utilities for the translation engine: an in-memory device with
//! fault injection, reference customizers against it, and a sample device
//! model wiring both registries.

pub mod customizers;
pub mod device;

use customizers::{
    AddressReader, AddressWriter, BridgeDomainReader, BridgeDomainWriter, BridgeMemberReader,
    BridgeMemberWriter, InterfaceReader, InterfaceWriter,
};
use device::FakeDevice;
use model::{NodeTypeId, Schema, SchemaBuilder};
use naming::SharedNamingStore;
use std::sync::Arc;
use translate::{
    ReaderRegistry, ReaderRegistryBuilder, RegistryError, WriterRegistry, WriterRegistryBuilder,
};

/// Naming namespace of interface handles.
pub const INTERFACE_NAMESPACE: &str = "interfaces";
/// Naming namespace of bridge-domain indices.
pub const BRIDGE_NAMESPACE: &str = "bridge-domains";

/// Node types of the sample device model:
/// `/interfaces/interface[..]/address[..]` and
/// `/bridge-domains/bridge-domain[..]/member[..]`.
#[derive(Clone, Debug)]
pub struct SampleModel {
    pub schema: Arc<Schema>,
    pub interfaces: NodeTypeId,
    pub interface: NodeTypeId,
    pub address: NodeTypeId,
    pub bridge_domains: NodeTypeId,
    pub bridge_domain: NodeTypeId,
    pub member: NodeTypeId,
}

/// Build the sample model schema.
///
/// The schema builder cannot fail here: all names are distinct and every
/// parent is declared first.
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
#[must_use]
pub fn sample_model() -> SampleModel {
    let mut builder = SchemaBuilder::new();
    let interfaces = builder.container("interfaces", None).unwrap();
    let interface = builder.list("interface", Some(interfaces)).unwrap();
    let address = builder.list("address", Some(interface)).unwrap();
    let bridge_domains = builder.container("bridge-domains", None).unwrap();
    let bridge_domain = builder.list("bridge-domain", Some(bridge_domains)).unwrap();
    let member = builder.list("member", Some(bridge_domain)).unwrap();
    SampleModel {
        schema: Arc::new(builder.build()),
        interfaces,
        interface,
        address,
        bridge_domains,
        bridge_domain,
        member,
    }
}

/// Writer registry over the sample model, fully covered.
///
/// Interfaces are registered before bridge domains, so bridge-domain writes
/// that reference an interface can rely on the interface existing.
pub fn sample_writers(
    model: &SampleModel,
    device: &Arc<FakeDevice>,
    store: SharedNamingStore,
) -> Result<WriterRegistry, RegistryError> {
    let mut builder = WriterRegistryBuilder::new(model.schema.clone(), store);
    builder.add_noop(model.interfaces)?;
    builder.add_named_list(
        model.interface,
        INTERFACE_NAMESPACE,
        Box::new(InterfaceWriter::new(device.clone())),
    )?;
    builder.add(
        model.address,
        Box::new(AddressWriter::new(device.clone(), model.interface)),
    )?;
    builder.add_noop(model.bridge_domains)?;
    builder.add_named_list(
        model.bridge_domain,
        BRIDGE_NAMESPACE,
        Box::new(BridgeDomainWriter::new(device.clone())),
    )?;
    builder.add(
        model.member,
        Box::new(BridgeMemberWriter::new(device.clone(), model.bridge_domain)),
    )?;
    builder.build()
}

/// Reader registry over the sample model, fully covered.
pub fn sample_readers(
    model: &SampleModel,
    device: &Arc<FakeDevice>,
    store: SharedNamingStore,
) -> Result<ReaderRegistry, RegistryError> {
    let mut builder = ReaderRegistryBuilder::new(model.schema.clone(), store);
    builder.add_structural(model.interfaces)?;
    builder.add_list(model.interface, Box::new(InterfaceReader::new(device.clone())))?;
    builder.add_list(
        model.address,
        Box::new(AddressReader::new(device.clone(), model.interface)),
    )?;
    builder.add_structural(model.bridge_domains)?;
    builder.add_list(
        model.bridge_domain,
        Box::new(BridgeDomainReader::new(device.clone())),
    )?;
    builder.add_list(
        model.member,
        Box::new(BridgeMemberReader::new(device.clone(), model.bridge_domain)),
    )?;
    builder.build()
}

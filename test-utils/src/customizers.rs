// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reference customizers binding the sample model to the fake device.
//!
//! Interfaces use device-assigned handles which the writer records in the
//! naming layer after a successful create; bridge domains use
//! controller-assigned indices allocated from the naming layer before the
//! device call. Both patterns occur on real devices.

use crate::device::{BridgeDomainRecord, DeviceError, FakeDevice, InterfaceRecord};
use crate::{BRIDGE_NAMESPACE, INTERFACE_NAMESPACE};
use model::{DataObject, Identifier, Key, NodeTypeId, Value};
use naming::{Handle, MappingContext};
use std::sync::Arc;
use tracing::debug;
use translate::{
    CustomizerError, ListReaderCustomizer, ReadContext, ReaderCustomizer, WriteContext,
    WriterCustomizer,
};

const INTERFACE_DUMP: &str = "interface-dump";
const BRIDGE_DUMP: &str = "bridge-domain-dump";

fn target_name(id: &Identifier) -> Result<String, CustomizerError> {
    id.target_key().map(ToString::to_string).ok_or_else(|| {
        CustomizerError::device(DeviceError::NoSuchResource(format!("key of '{id}'")))
    })
}

fn lookup(
    naming: &mut MappingContext,
    namespace: &str,
    name: &str,
) -> Result<Handle, CustomizerError> {
    naming.handle_of(namespace, name).ok_or_else(|| {
        CustomizerError::device(DeviceError::NoSuchResource(format!("{namespace}/{name}")))
    })
}

fn num_attr(data: &DataObject, name: &str, default: u32) -> u32 {
    match data.attr(name) {
        Some(Value::Num(n)) => u32::try_from(*n).unwrap_or(default),
        _ => default,
    }
}

fn bool_attr(data: &DataObject, name: &str, default: bool) -> bool {
    match data.attr(name) {
        Some(Value::Bool(b)) => *b,
        _ => default,
    }
}

/// One interface dump per read or write invocation, shared through the
/// context cache.
fn interface_dump(
    device: &FakeDevice,
    ctx: &mut ReadContext,
) -> Result<Vec<(Handle, InterfaceRecord)>, CustomizerError> {
    if let Some(dump) = ctx.cache().get::<Vec<(Handle, InterfaceRecord)>>(INTERFACE_DUMP) {
        return Ok(dump.clone());
    }
    let dump = device.interface_dump().map_err(CustomizerError::device)?;
    ctx.cache().insert(INTERFACE_DUMP, dump.clone());
    Ok(dump)
}

fn bridge_dump(
    device: &FakeDevice,
    ctx: &mut ReadContext,
) -> Result<Vec<(Handle, BridgeDomainRecord)>, CustomizerError> {
    if let Some(dump) = ctx.cache().get::<Vec<(Handle, BridgeDomainRecord)>>(BRIDGE_DUMP) {
        return Ok(dump.clone());
    }
    let dump = device.bridge_domain_dump().map_err(CustomizerError::device)?;
    ctx.cache().insert(BRIDGE_DUMP, dump.clone());
    Ok(dump)
}

/// Writer for `/interfaces/interface`.
pub struct InterfaceWriter {
    device: Arc<FakeDevice>,
}

impl InterfaceWriter {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self { device }
    }
}

impl WriterCustomizer for InterfaceWriter {
    fn write_current(
        &self,
        id: &Identifier,
        data: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let handle = self
            .device
            .interface_create(num_attr(data, "mtu", 1500), bool_attr(data, "enabled", true))
            .map_err(CustomizerError::device)?;
        ctx.naming()
            .learn(INTERFACE_NAMESPACE, &name, handle)
            .map_err(CustomizerError::device)?;
        debug!("Created interface '{name}' as {handle}");
        Ok(())
    }

    fn update_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        after: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let handle = lookup(ctx.naming(), INTERFACE_NAMESPACE, &name)?;
        self.device
            .interface_update(
                handle,
                num_attr(after, "mtu", 1500),
                bool_attr(after, "enabled", true),
            )
            .map_err(CustomizerError::device)
    }

    fn delete_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let handle = lookup(ctx.naming(), INTERFACE_NAMESPACE, &name)?;
        self.device
            .interface_delete(handle)
            .map_err(CustomizerError::device)?;
        ctx.naming().remove(INTERFACE_NAMESPACE, &name);
        debug!("Deleted interface '{name}' ({handle})");
        Ok(())
    }
}

/// Writer for `/interfaces/interface/address`. No in-place update: an
/// address either exists or it does not.
pub struct AddressWriter {
    device: Arc<FakeDevice>,
    interface: NodeTypeId,
}

impl AddressWriter {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>, interface: NodeTypeId) -> Self {
        Self { device, interface }
    }

    fn interface_handle(
        &self,
        id: &Identifier,
        ctx: &mut WriteContext,
    ) -> Result<Handle, CustomizerError> {
        let name = id.first_key_of(self.interface).map(ToString::to_string).ok_or_else(|| {
            CustomizerError::device(DeviceError::NoSuchResource(format!(
                "interface key of '{id}'"
            )))
        })?;
        lookup(ctx.naming(), INTERFACE_NAMESPACE, &name)
    }
}

impl WriterCustomizer for AddressWriter {
    fn write_current(
        &self,
        id: &Identifier,
        _data: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let address = target_name(id)?;
        let handle = self.interface_handle(id, ctx)?;
        self.device
            .address_add(handle, &address)
            .map_err(CustomizerError::device)
    }

    fn delete_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let address = target_name(id)?;
        let handle = self.interface_handle(id, ctx)?;
        self.device
            .address_del(handle, &address)
            .map_err(CustomizerError::device)
    }
}

/// Writer for `/bridge-domains/bridge-domain`.
pub struct BridgeDomainWriter {
    device: Arc<FakeDevice>,
}

impl BridgeDomainWriter {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self { device }
    }
}

impl WriterCustomizer for BridgeDomainWriter {
    fn write_current(
        &self,
        id: &Identifier,
        data: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let index = ctx.naming().get_or_allocate(BRIDGE_NAMESPACE, &name);
        self.device
            .bridge_domain_add(index, bool_attr(data, "flood", true))
            .map_err(CustomizerError::device)?;
        debug!("Created bridge domain '{name}' as {index}");
        Ok(())
    }

    fn update_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        after: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let index = lookup(ctx.naming(), BRIDGE_NAMESPACE, &name)?;
        self.device
            .bridge_domain_set(index, bool_attr(after, "flood", true))
            .map_err(CustomizerError::device)
    }

    fn delete_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let name = target_name(id)?;
        let index = lookup(ctx.naming(), BRIDGE_NAMESPACE, &name)?;
        self.device
            .bridge_domain_del(index)
            .map_err(CustomizerError::device)?;
        ctx.naming().remove(BRIDGE_NAMESPACE, &name);
        Ok(())
    }
}

/// Writer for `/bridge-domains/bridge-domain/member`, keyed by interface
/// name.
pub struct BridgeMemberWriter {
    device: Arc<FakeDevice>,
    bridge_domain: NodeTypeId,
}

impl BridgeMemberWriter {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>, bridge_domain: NodeTypeId) -> Self {
        Self {
            device,
            bridge_domain,
        }
    }

    fn resolve(
        &self,
        id: &Identifier,
        ctx: &mut WriteContext,
    ) -> Result<(Handle, Handle), CustomizerError> {
        let bridge = id
            .first_key_of(self.bridge_domain)
            .map(ToString::to_string)
            .ok_or_else(|| {
                CustomizerError::device(DeviceError::NoSuchResource(format!(
                    "bridge-domain key of '{id}'"
                )))
            })?;
        let member = target_name(id)?;
        let index = lookup(ctx.naming(), BRIDGE_NAMESPACE, &bridge)?;
        let handle = lookup(ctx.naming(), INTERFACE_NAMESPACE, &member)?;
        Ok((index, handle))
    }
}

impl WriterCustomizer for BridgeMemberWriter {
    fn write_current(
        &self,
        id: &Identifier,
        _data: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let (index, handle) = self.resolve(id, ctx)?;
        self.device
            .bridge_member_add(index, handle)
            .map_err(CustomizerError::device)
    }

    fn delete_current(
        &self,
        id: &Identifier,
        _before: &DataObject,
        ctx: &mut WriteContext,
    ) -> Result<(), CustomizerError> {
        let (index, handle) = self.resolve(id, ctx)?;
        self.device
            .bridge_member_del(index, handle)
            .map_err(CustomizerError::device)
    }
}

/// Reader for `/interfaces/interface`.
pub struct InterfaceReader {
    device: Arc<FakeDevice>,
}

impl InterfaceReader {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self { device }
    }
}

impl ReaderCustomizer for InterfaceReader {
    fn read_current(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError> {
        let name = target_name(id)?;
        let Some(handle) = ctx.naming().handle_of(INTERFACE_NAMESPACE, &name) else {
            return Ok(None);
        };
        let dump = interface_dump(&self.device, ctx)?;
        Ok(dump.iter().find(|(h, _)| *h == handle).map(|(_, record)| {
            DataObject::list_entry(id.target_type(), name.as_str())
                .with_attr("mtu", record.mtu)
                .with_attr("enabled", record.enabled)
        }))
    }
}

impl ListReaderCustomizer for InterfaceReader {
    fn read_all_keys(
        &self,
        _id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<Key>, CustomizerError> {
        let dump = interface_dump(&self.device, ctx)?;
        // interfaces the engine never named (e.g. pre-provisioned ones)
        // stay invisible to the model
        Ok(dump
            .iter()
            .filter_map(|(handle, _)| ctx.naming().name_of(INTERFACE_NAMESPACE, *handle))
            .map(Key::from)
            .collect())
    }
}

/// Reader for `/interfaces/interface/address`.
pub struct AddressReader {
    device: Arc<FakeDevice>,
    interface: NodeTypeId,
}

impl AddressReader {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>, interface: NodeTypeId) -> Self {
        Self { device, interface }
    }

    fn record(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<InterfaceRecord>, CustomizerError> {
        let Some(name) = id.first_key_of(self.interface).map(ToString::to_string) else {
            return Ok(None);
        };
        let Some(handle) = ctx.naming().handle_of(INTERFACE_NAMESPACE, &name) else {
            return Ok(None);
        };
        let dump = interface_dump(&self.device, ctx)?;
        Ok(dump
            .into_iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, record)| record))
    }
}

impl ReaderCustomizer for AddressReader {
    fn read_current(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError> {
        let address = target_name(id)?;
        Ok(self.record(id, ctx)?.and_then(|record| {
            record
                .addresses
                .contains(&address)
                .then(|| DataObject::list_entry(id.target_type(), address.as_str()))
        }))
    }
}

impl ListReaderCustomizer for AddressReader {
    fn read_all_keys(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<Key>, CustomizerError> {
        Ok(self
            .record(id, ctx)?
            .map(|record| {
                record
                    .addresses
                    .iter()
                    .map(|address| Key::from(address.as_str()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reader for `/bridge-domains/bridge-domain`.
pub struct BridgeDomainReader {
    device: Arc<FakeDevice>,
}

impl BridgeDomainReader {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self { device }
    }
}

impl ReaderCustomizer for BridgeDomainReader {
    fn read_current(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError> {
        let name = target_name(id)?;
        let Some(index) = ctx.naming().handle_of(BRIDGE_NAMESPACE, &name) else {
            return Ok(None);
        };
        let dump = bridge_dump(&self.device, ctx)?;
        Ok(dump.iter().find(|(h, _)| *h == index).map(|(_, record)| {
            DataObject::list_entry(id.target_type(), name.as_str())
                .with_attr("flood", record.flood)
        }))
    }
}

impl ListReaderCustomizer for BridgeDomainReader {
    fn read_all_keys(
        &self,
        _id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<Key>, CustomizerError> {
        let dump = bridge_dump(&self.device, ctx)?;
        Ok(dump
            .iter()
            .filter_map(|(index, _)| ctx.naming().name_of(BRIDGE_NAMESPACE, *index))
            .map(Key::from)
            .collect())
    }
}

/// Reader for `/bridge-domains/bridge-domain/member`.
pub struct BridgeMemberReader {
    device: Arc<FakeDevice>,
    bridge_domain: NodeTypeId,
}

impl BridgeMemberReader {
    #[must_use]
    pub fn new(device: Arc<FakeDevice>, bridge_domain: NodeTypeId) -> Self {
        Self {
            device,
            bridge_domain,
        }
    }

    fn members(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<String>, CustomizerError> {
        let Some(bridge) = id.first_key_of(self.bridge_domain).map(ToString::to_string) else {
            return Ok(Vec::new());
        };
        let Some(index) = ctx.naming().handle_of(BRIDGE_NAMESPACE, &bridge) else {
            return Ok(Vec::new());
        };
        let dump = bridge_dump(&self.device, ctx)?;
        let Some((_, record)) = dump.into_iter().find(|(h, _)| *h == index) else {
            return Ok(Vec::new());
        };
        Ok(record
            .members
            .iter()
            .filter_map(|member| ctx.naming().name_of(INTERFACE_NAMESPACE, *member))
            .collect())
    }
}

impl ReaderCustomizer for BridgeMemberReader {
    fn read_current(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Option<DataObject>, CustomizerError> {
        let member = target_name(id)?;
        Ok(self
            .members(id, ctx)?
            .contains(&member)
            .then(|| DataObject::list_entry(id.target_type(), member.as_str())))
    }
}

impl ListReaderCustomizer for BridgeMemberReader {
    fn read_all_keys(
        &self,
        id: &Identifier,
        ctx: &mut ReadContext,
    ) -> Result<Vec<Key>, CustomizerError> {
        Ok(self.members(id, ctx)?.into_iter().map(Key::from).collect())
    }
}

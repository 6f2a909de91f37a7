// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! In-memory stand-in for a forwarding device.
//!
//! The device keeps interface and bridge-domain tables addressed by compact
//! handles, logs every operation it executes, and can be told to reject
//! named operations so failure and revert paths are exercisable.

use naming::Handle;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;
use tracing::trace;

/// The reasons a device operation may be rejected
#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("Device rejected '{0}': injected failure")]
    Injected(String),
    #[error("No such resource: {0}")]
    NoSuchResource(String),
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),
}

/// One interface as the device sees it. Names live in the naming layer,
/// not on the device.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InterfaceRecord {
    pub mtu: u32,
    pub enabled: bool,
    pub addresses: BTreeSet<String>,
}

/// One bridge domain with its member interface handles.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BridgeDomainRecord {
    pub flood: bool,
    pub members: BTreeSet<Handle>,
}

/// Full device state, for snapshot comparisons in tests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceState {
    pub interfaces: BTreeMap<Handle, InterfaceRecord>,
    pub bridge_domains: BTreeMap<Handle, BridgeDomainRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    state: DeviceState,
    next_if_index: u32,
    ops: Vec<String>,
    failing: HashSet<String>,
}

/// Shared in-memory device.
#[derive(Debug, Default)]
pub struct FakeDevice {
    inner: Mutex<Inner>,
}

impl FakeDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail until cleared.
    pub fn fail_on(&self, op: &str) {
        self.inner.lock().failing.insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failing.clear();
    }

    /// Operations executed so far, including rejected ones.
    #[must_use]
    pub fn ops(&self) -> Vec<String> {
        self.inner.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.inner.lock().ops.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.lock().state.clone()
    }
}

impl Inner {
    fn guard(&mut self, op: &str) -> Result<(), DeviceError> {
        trace!("device op: {op}");
        self.ops.push(op.to_string());
        if self.failing.contains(op) {
            return Err(DeviceError::Injected(op.to_string()));
        }
        Ok(())
    }
}

impl FakeDevice {
    /// Create an interface; the device assigns the handle.
    pub fn interface_create(&self, mtu: u32, enabled: bool) -> Result<Handle, DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("interface-create")?;
        let handle = Handle::new(inner.next_if_index);
        inner.next_if_index += 1;
        inner.state.interfaces.insert(
            handle,
            InterfaceRecord {
                mtu,
                enabled,
                addresses: BTreeSet::new(),
            },
        );
        Ok(handle)
    }

    pub fn interface_update(
        &self,
        handle: Handle,
        mtu: u32,
        enabled: bool,
    ) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("interface-update")?;
        let record = inner
            .state
            .interfaces
            .get_mut(&handle)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("interface {handle}")))?;
        record.mtu = mtu;
        record.enabled = enabled;
        Ok(())
    }

    pub fn interface_delete(&self, handle: Handle) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("interface-delete")?;
        inner
            .state
            .interfaces
            .remove(&handle)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("interface {handle}")))?;
        Ok(())
    }

    pub fn interface_dump(&self) -> Result<Vec<(Handle, InterfaceRecord)>, DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("interface-dump")?;
        Ok(inner
            .state
            .interfaces
            .iter()
            .map(|(handle, record)| (*handle, record.clone()))
            .collect())
    }

    pub fn address_add(&self, handle: Handle, address: &str) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("address-add")?;
        let record = inner
            .state
            .interfaces
            .get_mut(&handle)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("interface {handle}")))?;
        if !record.addresses.insert(address.to_string()) {
            return Err(DeviceError::AlreadyExists(format!(
                "address {address} on interface {handle}"
            )));
        }
        Ok(())
    }

    pub fn address_del(&self, handle: Handle, address: &str) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("address-del")?;
        let record = inner
            .state
            .interfaces
            .get_mut(&handle)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("interface {handle}")))?;
        if !record.addresses.remove(address) {
            return Err(DeviceError::NoSuchResource(format!(
                "address {address} on interface {handle}"
            )));
        }
        Ok(())
    }

    /// Create a bridge domain under a caller-assigned index.
    pub fn bridge_domain_add(&self, index: Handle, flood: bool) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-domain-add")?;
        if inner.state.bridge_domains.contains_key(&index) {
            return Err(DeviceError::AlreadyExists(format!("bridge domain {index}")));
        }
        inner.state.bridge_domains.insert(
            index,
            BridgeDomainRecord {
                flood,
                members: BTreeSet::new(),
            },
        );
        Ok(())
    }

    pub fn bridge_domain_set(&self, index: Handle, flood: bool) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-domain-set")?;
        inner
            .state
            .bridge_domains
            .get_mut(&index)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("bridge domain {index}")))?
            .flood = flood;
        Ok(())
    }

    pub fn bridge_domain_del(&self, index: Handle) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-domain-del")?;
        inner
            .state
            .bridge_domains
            .remove(&index)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("bridge domain {index}")))?;
        Ok(())
    }

    pub fn bridge_domain_dump(&self) -> Result<Vec<(Handle, BridgeDomainRecord)>, DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-domain-dump")?;
        Ok(inner
            .state
            .bridge_domains
            .iter()
            .map(|(index, record)| (*index, record.clone()))
            .collect())
    }

    pub fn bridge_member_add(&self, index: Handle, member: Handle) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-member-add")?;
        if !inner.state.interfaces.contains_key(&member) {
            return Err(DeviceError::NoSuchResource(format!("interface {member}")));
        }
        let record = inner
            .state
            .bridge_domains
            .get_mut(&index)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("bridge domain {index}")))?;
        if !record.members.insert(member) {
            return Err(DeviceError::AlreadyExists(format!(
                "member {member} of bridge domain {index}"
            )));
        }
        Ok(())
    }

    pub fn bridge_member_del(&self, index: Handle, member: Handle) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.guard("bridge-member-del")?;
        let record = inner
            .state
            .bridge_domains
            .get_mut(&index)
            .ok_or_else(|| DeviceError::NoSuchResource(format!("bridge domain {index}")))?;
        if !record.members.remove(&member) {
            return Err(DeviceError::NoSuchResource(format!(
                "member {member} of bridge domain {index}"
            )));
        }
        Ok(())
    }
}

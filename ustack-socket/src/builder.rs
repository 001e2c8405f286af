//! # Device Builder
//!
//! ## Purpose
//!
//! This module configures and finalizes devices. The engine's builder is a
//! handle that every configuration call consumes and replaces, and that the
//! finalize call consumes for good in exchange for a device handle; the
//! `DeviceBuilder` wrapper turns that protocol into an explicit two-state
//! machine with single-ownership guarantees.
//!
//! ## How it works
//!
//! The builder holds its handle in a `HandleSlot`. Each configuration step
//! takes the handle out of the slot, passes it to the engine, and stores the
//! returned replacement; the old value is consumed by the call and must never
//! be freed separately. `finalize` empties the slot permanently and wraps
//! the resulting device handle in a `Device`, after which any further call on
//! the builder fails with a use-after-free error. Dropping a builder that
//! was never finalized releases the held handle through the builder-destroy
//! entry point, which is a distinct native resource from the device.
//!
//! ## Main components
//!
//! - `DeviceBuilder`: the finite-state builder.
//! - `make_l2_device()`, `make_l3_device()`, `make_device()`: fixed call
//!   sequences for the common Ethernet and raw-IP setups.

use crate::device::Device;
use crate::engine::{Engine, Medium};
use crate::error::{Error, Result};
use crate::handle::{HandleSlot, RawHandle};
use eui48::MacAddress;
use ipnet::IpNet;
use std::net::IpAddr;

/// Incrementally configures engine options and is consumed exactly once into
/// a [`Device`].
pub struct DeviceBuilder<'e, E: Engine> {
    engine: &'e E,
    slot: HandleSlot,
}

impl<'e, E: Engine> DeviceBuilder<'e, E> {
    /// Allocates a fresh builder handle.
    pub fn new(engine: &'e E) -> Result<Self> {
        let slot = HandleSlot::acquire(engine.builder_new(), "builder")?;
        Ok(DeviceBuilder { engine, slot })
    }

    /// Runs one configuration step, replacing the held handle with the value
    /// the engine returns. The old handle is consumed by the call itself.
    fn replace(&self, step: impl FnOnce(&'e E, RawHandle) -> RawHandle) -> Result<()> {
        let old = self.slot.take_live()?;
        self.slot.put(step(self.engine, old))
    }

    pub fn set_hardware_addr(&mut self, mac: MacAddress) -> Result<()> {
        self.replace(|e, h| e.builder_set_hardware_addr(h, mac.into()))
    }

    pub fn init_neighbour_cache(&mut self) -> Result<()> {
        self.replace(|e, h| e.builder_init_neighbour_cache(h))
    }

    /// Enables 6LoWPAN, an optional engine capability.
    ///
    /// Probes the engine first and reports `Error::NotSupported` when the
    /// capability is absent, leaving the builder untouched.
    pub fn init_sixlowpan(&mut self) -> Result<()> {
        if !self.engine.supports_sixlowpan() {
            return Err(Error::NotSupported("sixlowpan"));
        }
        self.replace(|e, h| e.builder_init_sixlowpan(h))
    }

    pub fn init_ipv4_fragments_cache(&mut self) -> Result<()> {
        self.replace(|e, h| e.builder_init_ipv4_fragments(h))
    }

    pub fn set_ip_addr(&mut self, addr: IpNet) -> Result<()> {
        self.replace(|e, h| e.builder_set_ip_addr(h, addr.into()))
    }

    pub fn set_routes(&mut self, gateway: IpAddr) -> Result<()> {
        self.replace(|e, h| e.builder_set_routes(h, gateway.into()))
    }

    /// Consumes the builder's handle and produces the device.
    ///
    /// The builder transitions to its consumed state whether or not the
    /// engine accepts the configuration; a null device handle is reported as
    /// an allocation failure, and any later call on this builder fails with
    /// `Error::UseAfterFree`.
    pub fn finalize(&mut self, medium: Medium, mtu: usize) -> Result<Device<'e, E>> {
        let raw = self.slot.take_live()?;
        log::debug!("finalizing builder into {medium:?} device, mtu {mtu}");
        Device::from_raw(self.engine, self.engine.builder_finalize(raw, medium, mtu))
    }
}

impl<E: Engine> Drop for DeviceBuilder<'_, E> {
    fn drop(&mut self) {
        // only reached when finalize was never called
        if let Some(raw) = self.slot.take() {
            self.engine.builder_free(raw);
        }
    }
}

fn init_l3<E: Engine>(
    builder: &mut DeviceBuilder<'_, E>,
    ip: Option<IpNet>,
    gateway: Option<IpAddr>,
) -> Result<()> {
    builder.init_ipv4_fragments_cache()?;
    if let Some(ip) = ip {
        builder.set_ip_addr(ip)?;
        // routes are meaningless without a local address
        if let Some(gateway) = gateway {
            builder.set_routes(gateway)?;
        }
    }
    Ok(())
}

/// Builds an Ethernet-medium device: hardware address, neighbour cache,
/// IPv4 fragment reassembly, then the optional address and routes.
pub fn make_l2_device<'e, E: Engine>(
    engine: &'e E,
    mtu: usize,
    mac: MacAddress,
    ip: Option<IpNet>,
    gateway: Option<IpAddr>,
) -> Result<Device<'e, E>> {
    let mut builder = DeviceBuilder::new(engine)?;
    builder.set_hardware_addr(mac)?;
    builder.init_neighbour_cache()?;
    init_l3(&mut builder, ip, gateway)?;
    builder.finalize(Medium::Ethernet, mtu)
}

/// Builds a raw-IP-medium device: IPv4 fragment reassembly, then the
/// optional address and routes.
pub fn make_l3_device<'e, E: Engine>(
    engine: &'e E,
    mtu: usize,
    ip: Option<IpNet>,
    gateway: Option<IpAddr>,
) -> Result<Device<'e, E>> {
    let mut builder = DeviceBuilder::new(engine)?;
    init_l3(&mut builder, ip, gateway)?;
    builder.finalize(Medium::Ip, mtu)
}

/// Builds a device, selecting the medium from the presence of a hardware
/// address: a MAC gives an L2 Ethernet device, its absence an L3 raw-IP one.
pub fn make_device<'e, E: Engine>(
    engine: &'e E,
    mtu: usize,
    mac: Option<MacAddress>,
    ip: Option<IpNet>,
    gateway: Option<IpAddr>,
) -> Result<Device<'e, E>> {
    match mac {
        Some(mac) => make_l2_device(engine, mtu, mac, ip, gateway),
        None => make_l3_device(engine, mtu, ip, gateway),
    }
}

//! # Device
//!
//! ## Purpose
//!
//! This module wraps the engine's interface handle. A `Device` pumps raw
//! packets in and out of the engine, drives the engine's internal scheduling
//! through `poll`, and is the factory for every socket kind.
//!
//! ## How it works
//!
//! The device owns its handle in a `HandleSlot` for its entire lifetime;
//! `free` (or drop) releases it exactly once through the device-destroy entry
//! point. Sockets created from a device keep a plain back-reference to it,
//! used only to fetch the device handle for engine calls, so the device stays
//! the single owner and a socket touched after the device was freed fails
//! with a use-after-free error instead of forwarding a stale handle.
//!
//! Packet exchange is explicit: the core imposes no timing policy and wires
//! nothing together. The caller polls at its own cadence, drains outgoing
//! packets with `pop_tx`, and injects incoming ones with `push_rx` -- also
//! between two devices, when two virtual interfaces are supposed to talk to
//! each other.
//!
//! ## Main components
//!
//! - `Device`: the interface handle owner.
//! - socket factories: `tcp_socket()`, `udp_socket()`, `icmp_socket()`,
//!   `dns_socket()`.

use crate::engine::Engine;
use crate::error::Result;
use crate::handle::{HandleSlot, RawHandle};
use crate::socket::{DnsSocket, IcmpSocket, TcpSocket, UdpSocket};
use std::net::IpAddr;

/// An interface handle owner; see the module docs.
pub struct Device<'e, E: Engine> {
    engine: &'e E,
    slot: HandleSlot,
}

impl<'e, E: Engine> Device<'e, E> {
    /// Wraps a device handle freshly returned by the engine's finalize call.
    pub(crate) fn from_raw(engine: &'e E, raw: RawHandle) -> Result<Self> {
        Ok(Device {
            engine,
            slot: HandleSlot::acquire(raw, "device")?,
        })
    }

    pub(crate) fn engine(&self) -> &'e E {
        self.engine
    }

    /// The live interface handle, or a use-after-free error.
    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.slot.get()
    }

    /// Drives one iteration of the engine's internal scheduling: timers,
    /// retransmissions, neighbour discovery. The only call that advances
    /// protocol time; the cadence is entirely the caller's.
    pub fn poll(&self) -> Result<()> {
        self.engine.device_poll(self.raw()?);
        Ok(())
    }

    /// Number of packets waiting in the outbound queue.
    ///
    /// A freed device reports no pending work rather than failing; teardown
    /// code drains queues in a loop and must be able to run to completion.
    pub fn tx_queue_len(&self) -> usize {
        match self.slot.get() {
            Ok(raw) => self.engine.device_tx_queue_len(raw),
            Err(_) => 0,
        }
    }

    /// Takes the next outgoing raw packet off the engine's queue.
    ///
    /// The buffer is sized to the exact byte length the engine reports and
    /// carries only bytes the engine actually wrote. Returns `None` when the
    /// queue is empty.
    pub fn pop_tx(&self) -> Result<Option<Vec<u8>>> {
        let raw = self.raw()?;
        let size = self.engine.device_last_tx_size(raw);
        if size == 0 {
            return Ok(None);
        }
        let mut packet = vec![0u8; size];
        let copied = self.engine.device_pop_tx(raw, &mut packet);
        if copied != size {
            // never hand back bytes the engine did not write
            log::warn!("engine copied {copied} of {size} reported tx bytes");
            packet.truncate(copied);
        }
        log::trace!("popped {} byte tx packet", packet.len());
        Ok(Some(packet))
    }

    /// Injects a raw packet into the engine's receive path. The engine does
    /// not retain the buffer past the call.
    pub fn push_rx(&self, packet: &[u8]) -> Result<()> {
        log::trace!("pushing {} byte rx packet", packet.len());
        self.engine.device_push_rx(self.raw()?, packet);
        Ok(())
    }

    pub fn tcp_socket(&self) -> Result<TcpSocket<'_, E>> {
        TcpSocket::new(self)
    }

    pub fn udp_socket(&self) -> Result<UdpSocket<'_, E>> {
        UdpSocket::new(self)
    }

    pub fn icmp_socket(&self) -> Result<IcmpSocket<'_, E>> {
        IcmpSocket::new(self)
    }

    /// Opens a DNS socket resolving against the given server address.
    pub fn dns_socket(&self, server: IpAddr) -> Result<DnsSocket<'_, E>> {
        DnsSocket::new(self, server)
    }

    /// Releases the interface handle. Idempotent; sockets created from this
    /// device fail their next operation once it has run.
    pub fn free(&self) {
        if let Some(raw) = self.slot.take() {
            self.engine.device_free(raw);
        }
    }
}

impl<E: Engine> Drop for Device<'_, E> {
    fn drop(&mut self) {
        self.free();
    }
}

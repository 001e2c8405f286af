//! # ICMP Socket
//!
//! ## Purpose
//!
//! Raw ICMP socket plus the echo packet builder. The socket binds either to
//! every ICMP packet or to a specific echo identifier, and exchanges packets
//! addressed by plain IP address rather than endpoint.
//!
//! ## How it works
//!
//! `build_echo_packet` hides the engine's two-phase contract behind one
//! operation: a first call with a null output buffer yields the required
//! size, a second call fills a buffer of exactly that size. A non-zero
//! status on the fill call is a build error.

use crate::addr::CAddress;
use crate::device::Device;
use crate::engine::{EchoKind, Engine, ErrorCode};
use crate::error::{Error, Result};
use crate::handle::{HandleSlot, RawHandle};
use std::net::{IpAddr, SocketAddr};

pub struct IcmpSocket<'a, E: Engine> {
    device: &'a Device<'a, E>,
    slot: HandleSlot,
}

impl<'a, E: Engine> IcmpSocket<'a, E> {
    pub(crate) fn new(device: &'a Device<'a, E>) -> Result<Self> {
        let raw = device.engine().icmp_new(device.raw()?);
        Ok(IcmpSocket {
            device,
            slot: HandleSlot::acquire(raw, "icmp socket")?,
        })
    }

    fn handles(&self) -> Result<(RawHandle, RawHandle)> {
        Ok((self.device.raw()?, self.slot.get()?))
    }

    /// Binds to every ICMP packet arriving on the device.
    pub fn bind_any(&self) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().icmp_bind_any(dev, sock) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Bind(code)),
        }
    }

    /// Binds to echo packets carrying the given identifier.
    pub fn bind_ident(&self, ident: u16) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().icmp_bind_ident(dev, sock, ident) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Bind(code)),
        }
    }

    /// Binds to ICMP errors concerning the given UDP endpoint.
    pub fn bind_udp(&self, endpoint: SocketAddr) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().icmp_bind_udp(dev, sock, endpoint.into()) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Bind(code)),
        }
    }

    pub fn send(&self, to: IpAddr, data: &[u8]) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().icmp_send(dev, sock, to.into(), data) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Send(code)),
        }
    }

    /// Copies the pending packet into `dst` and returns the sender address.
    pub fn receive(&self, dst: &mut [u8]) -> Result<IpAddr> {
        let (dev, sock) = self.handles()?;
        let mut from = CAddress::default();
        match self.device.engine().icmp_receive(dev, sock, &mut from, dst) {
            ErrorCode::OK => Ok(from.to_ip()),
            code => Err(Error::Receive(code)),
        }
    }

    /// Convenience forward to [`build_echo_packet`].
    pub fn build_echo_packet(
        &self,
        kind: EchoKind,
        ident: u16,
        seq_no: u16,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        build_echo_packet(self.device.engine(), kind, ident, seq_no, payload)
    }

    /// Releases the socket handle. Idempotent.
    pub fn free(&self) {
        if let Some(raw) = self.slot.take() {
            self.device.engine().icmp_free(raw);
        }
    }
}

impl<E: Engine> Drop for IcmpSocket<'_, E> {
    fn drop(&mut self) {
        self.free();
    }
}

/// Builds an ICMPv4 echo packet, checksummed by the engine.
///
/// Sizes the output by the engine's own query phase, so the returned packet
/// is exact and never exposes partially initialized bytes.
pub fn build_echo_packet<E: Engine>(
    engine: &E,
    kind: EchoKind,
    ident: u16,
    seq_no: u16,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let size = engine.icmp_build_echo(kind, ident, seq_no, payload, None) as usize;
    let mut packet = vec![0u8; size];
    match engine.icmp_build_echo(kind, ident, seq_no, payload, Some(&mut packet)) {
        0 => Ok(packet),
        status => Err(Error::EchoBuild(status)),
    }
}

//! # UDP Socket
//!
//! ## Purpose
//!
//! Datagram socket bound to a local port, sending to and receiving from
//! explicit endpoints.
//!
//! ## How it works
//!
//! `receive` hides the engine's two-call contract behind one operation: it
//! first queries the size of the last received datagram, allocates a buffer
//! of exactly that size, and then performs the receive call, which also
//! fills in the sender endpoint. Callers never see a partially initialized
//! buffer. All status codes come back verbatim inside typed errors.

use crate::addr::CEndpoint;
use crate::device::Device;
use crate::engine::{Engine, ErrorCode};
use crate::error::{Error, Result};
use crate::handle::{HandleSlot, RawHandle};
use std::net::SocketAddr;

pub struct UdpSocket<'a, E: Engine> {
    device: &'a Device<'a, E>,
    slot: HandleSlot,
}

impl<'a, E: Engine> UdpSocket<'a, E> {
    pub(crate) fn new(device: &'a Device<'a, E>) -> Result<Self> {
        let raw = device.engine().udp_new(device.raw()?);
        Ok(UdpSocket {
            device,
            slot: HandleSlot::acquire(raw, "udp socket")?,
        })
    }

    /// Device and socket handles, both checked for liveness.
    fn handles(&self) -> Result<(RawHandle, RawHandle)> {
        Ok((self.device.raw()?, self.slot.get()?))
    }

    pub fn bind(&self, port: u16) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().udp_bind(dev, sock, port) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Bind(code)),
        }
    }

    pub fn send(&self, remote: SocketAddr, data: &[u8]) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self.device.engine().udp_send(dev, sock, remote.into(), data) {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Send(code)),
        }
    }

    /// Receives the pending datagram and its sender endpoint.
    pub fn receive(&self) -> Result<(SocketAddr, Vec<u8>)> {
        let (dev, sock) = self.handles()?;
        let engine = self.device.engine();
        let size = engine.udp_last_rx_size(dev, sock);
        let mut data = vec![0u8; size];
        let mut from = CEndpoint::default();
        match engine.udp_receive(dev, sock, &mut from, &mut data) {
            ErrorCode::OK => Ok((from.to_socket_addr(), data)),
            code => Err(Error::Receive(code)),
        }
    }

    /// Releases the socket handle. Idempotent.
    pub fn free(&self) {
        if let Some(raw) = self.slot.take() {
            self.device.engine().udp_free(raw);
        }
    }
}

impl<E: Engine> Drop for UdpSocket<'_, E> {
    fn drop(&mut self) {
        self.free();
    }
}

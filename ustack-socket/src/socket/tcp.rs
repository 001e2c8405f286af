//! # TCP Socket
//!
//! ## Purpose
//!
//! Stream socket in either the connecting or listening role. The engine runs
//! the actual TCP state machine; this wrapper converts endpoints to wire form
//! and interprets the connect status code against the error taxonomy.

use crate::device::Device;
use crate::engine::{Engine, ErrorCode};
use crate::error::{Error, Result};
use crate::handle::{HandleSlot, RawHandle};
use std::net::SocketAddr;

pub struct TcpSocket<'a, E: Engine> {
    device: &'a Device<'a, E>,
    slot: HandleSlot,
}

impl<'a, E: Engine> TcpSocket<'a, E> {
    pub(crate) fn new(device: &'a Device<'a, E>) -> Result<Self> {
        let raw = device.engine().tcp_new(device.raw()?);
        Ok(TcpSocket {
            device,
            slot: HandleSlot::acquire(raw, "tcp socket")?,
        })
    }

    fn handles(&self) -> Result<(RawHandle, RawHandle)> {
        Ok((self.device.raw()?, self.slot.get()?))
    }

    /// Opens a connection to `remote` from the given local port.
    pub fn connect(&self, remote: SocketAddr, local_port: u16) -> Result<()> {
        let (dev, sock) = self.handles()?;
        match self
            .device
            .engine()
            .tcp_connect(dev, sock, remote.into(), local_port)
        {
            ErrorCode::OK => Ok(()),
            code => Err(Error::Connect(code)),
        }
    }

    pub fn listen(&self, port: u16) -> Result<()> {
        let (dev, sock) = self.handles()?;
        self.device.engine().tcp_listen(dev, sock, port);
        Ok(())
    }

    pub fn send(&self, data: &[u8]) -> Result<()> {
        let (dev, sock) = self.handles()?;
        self.device.engine().tcp_send(dev, sock, data);
        Ok(())
    }

    /// Copies pending stream data into `dst`. The ABI reports no length for
    /// TCP, so the caller provides the buffer.
    pub fn receive(&self, dst: &mut [u8]) -> Result<()> {
        let (dev, sock) = self.handles()?;
        self.device.engine().tcp_receive(dev, sock, dst);
        Ok(())
    }

    pub fn is_active(&self) -> Result<bool> {
        let (dev, sock) = self.handles()?;
        Ok(self.device.engine().tcp_is_active(dev, sock))
    }

    /// Releases the socket handle. Idempotent.
    pub fn free(&self) {
        if let Some(raw) = self.slot.take() {
            self.device.engine().tcp_free(raw);
        }
    }
}

impl<E: Engine> Drop for TcpSocket<'_, E> {
    fn drop(&mut self) {
        self.free();
    }
}

//! # DNS Socket
//!
//! ## Purpose
//!
//! DNS resolver socket bound to a server address, issuing name queries.
//! Query polling and result retrieval live entirely on the engine side; the
//! binding only allocates queries through the dedicated query-creation entry
//! point and hands back the handle.

use crate::device::Device;
use crate::engine::Engine;
use crate::error::Result;
use crate::handle::{HandleSlot, RawHandle};
use std::net::IpAddr;

pub struct DnsSocket<'a, E: Engine> {
    device: &'a Device<'a, E>,
    slot: HandleSlot,
}

impl<'a, E: Engine> DnsSocket<'a, E> {
    pub(crate) fn new(device: &'a Device<'a, E>, server: IpAddr) -> Result<Self> {
        let raw = device.engine().dns_socket_new(device.raw()?, server.into());
        Ok(DnsSocket {
            device,
            slot: HandleSlot::acquire(raw, "dns socket")?,
        })
    }

    fn handles(&self) -> Result<(RawHandle, RawHandle)> {
        Ok((self.device.raw()?, self.slot.get()?))
    }

    /// Starts a query for `name` against this socket's server.
    pub fn query(&self, name: &str) -> Result<DnsQuery> {
        let (dev, sock) = self.handles()?;
        let raw = self.device.engine().dns_query_new(dev, sock, name.as_bytes());
        Ok(DnsQuery {
            slot: HandleSlot::acquire(raw, "dns query")?,
        })
    }

    /// Releases the socket handle. Idempotent.
    pub fn free(&self) {
        if let Some(raw) = self.slot.take() {
            self.device.engine().dns_socket_free(raw);
        }
    }
}

impl<E: Engine> Drop for DnsSocket<'_, E> {
    fn drop(&mut self) {
        self.free();
    }
}

/// A pending DNS query. The query's storage belongs to the engine and is
/// reclaimed with its socket; the ABI exposes no destroy entry point for it.
pub struct DnsQuery {
    slot: HandleSlot,
}

impl DnsQuery {
    /// The raw query handle, for engine-side polling.
    pub fn raw(&self) -> Result<RawHandle> {
        self.slot.get()
    }
}

//! # Address Wire Codec
//!
//! ## Purpose
//!
//! This module converts between host address types (`std::net::IpAddr`,
//! `std::net::SocketAddr`, `ipnet::IpNet`, `eui48::MacAddress`) and the
//! fixed-width `#[repr(C)]` structures the engine exchanges over its ABI.
//!
//! ## How it works
//!
//! The wire form of an address is always 16 bytes. An IPv4 address is
//! carried in its canonical IPv4-mapped-IPv6 shape: ten zero bytes, two 0xFF
//! bytes, then the four IPv4 bytes. Decoding applies the mapped-prefix test,
//! so a 16-byte value with that prefix comes back as IPv4 and anything else
//! as IPv6. Interfaces carry a prefix length measured against the wire form,
//! which means an IPv4 prefix travels +96 and is restored by subtracting the
//! mapping prefix width on decode; a wire value that decodes to IPv4 with a
//! prefix below 96 is malformed and rejected rather than wrapped around.
//!
//! All conversions are pure and total except the explicit length and prefix
//! checks, and each `to`/`from` pair round-trips exactly.
//!
//! ## Main components
//!
//! - `CAddress`, `CMacAddress`, `CEndpoint`, `CInterface`: the wire structs.
//! - `address_from_wire`, `mac_from_wire`: length-checked decoders for packed
//!   byte strings.

use crate::error::{Error, Result};
use eui48::MacAddress;
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// The first 12 bytes of an IPv4-mapped-IPv6 address (`::ffff:0:0/96`).
pub const MAPPED_V4_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];

/// Bit width of [`MAPPED_V4_PREFIX`], added to IPv4 prefix lengths on the wire.
pub const MAPPED_V4_PREFIX_BITS: u8 = 96;

/// A 16-byte wire address; IPv4 values travel in mapped form.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CAddress {
    pub ip: [u8; 16],
}

/// A 6-byte wire hardware address.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CMacAddress {
    pub mac: [u8; 6],
}

/// A wire interface: prefix length over the wire representation plus address.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CInterface {
    pub prefix: u8,
    pub addr: CAddress,
}

/// A wire endpoint: port plus address.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CEndpoint {
    pub port: u16,
    pub addr: CAddress,
}

impl From<IpAddr> for CAddress {
    fn from(addr: IpAddr) -> Self {
        let ip = match addr {
            IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
            IpAddr::V6(v6) => v6.octets(),
        };
        CAddress { ip }
    }
}

impl CAddress {
    /// Decodes the wire value, undoing the IPv4 mapping when present.
    pub fn to_ip(self) -> IpAddr {
        let v6 = Ipv6Addr::from(self.ip);
        match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        }
    }
}

/// Decodes a packed address of any accepted length.
///
/// 16 bytes are decoded with the mapped-prefix test, 4 bytes directly as
/// IPv4; anything else is a format error.
pub fn address_from_wire(bytes: &[u8]) -> Result<IpAddr> {
    match bytes.len() {
        16 => {
            let mut ip = [0u8; 16];
            ip.copy_from_slice(bytes);
            Ok(CAddress { ip }.to_ip())
        }
        4 => {
            let mut ip = [0u8; 4];
            ip.copy_from_slice(bytes);
            Ok(IpAddr::V4(Ipv4Addr::from(ip)))
        }
        len => Err(Error::AddressLength(len)),
    }
}

impl From<MacAddress> for CMacAddress {
    fn from(mac: MacAddress) -> Self {
        CMacAddress {
            mac: mac.to_array(),
        }
    }
}

impl CMacAddress {
    pub fn to_mac(self) -> MacAddress {
        MacAddress::new(self.mac)
    }
}

/// Decodes a packed 6-byte hardware address.
pub fn mac_from_wire(bytes: &[u8]) -> Result<MacAddress> {
    let mac: [u8; 6] = bytes
        .try_into()
        .map_err(|_| Error::MacLength(bytes.len()))?;
    Ok(MacAddress::new(mac))
}

impl From<SocketAddr> for CEndpoint {
    fn from(endpoint: SocketAddr) -> Self {
        CEndpoint {
            port: endpoint.port(),
            addr: endpoint.ip().into(),
        }
    }
}

impl CEndpoint {
    pub fn to_socket_addr(self) -> SocketAddr {
        SocketAddr::new(self.addr.to_ip(), self.port)
    }
}

impl From<IpNet> for CInterface {
    fn from(net: IpNet) -> Self {
        // the address goes out in mapped form, so the prefix follows it
        let prefix = match net {
            IpNet::V4(_) => net.prefix_len() + MAPPED_V4_PREFIX_BITS,
            IpNet::V6(_) => net.prefix_len(),
        };
        CInterface {
            prefix,
            addr: net.addr().into(),
        }
    }
}

impl CInterface {
    /// Decodes the wire interface, restoring the logical IPv4 prefix.
    ///
    /// A value that decodes to IPv4 with a wire prefix below 96 is malformed
    /// input and is rejected.
    pub fn to_net(self) -> Result<IpNet> {
        let addr = self.addr.to_ip();
        let prefix = match addr {
            IpAddr::V4(_) => self
                .prefix
                .checked_sub(MAPPED_V4_PREFIX_BITS)
                .ok_or(Error::PrefixUnderflow(self.prefix))?,
            IpAddr::V6(_) => self.prefix,
        };
        Ok(IpNet::new(addr, prefix)?)
    }
}

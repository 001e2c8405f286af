//! # Socket Family
//!
//! ## Purpose
//!
//! This module hosts the protocol sockets a device can open: TCP, UDP, ICMP
//! and DNS. Every socket owns one native socket handle and keeps a
//! non-owning back-reference to its parent device.
//!
//! ## How it works
//!
//! Each socket stores its handle in a `HandleSlot` and frees it through the
//! protocol-specific destroy entry point, independently of the device's own
//! lifetime. Every engine call passes the device handle alongside the socket
//! handle, and the device reference is consulted first: an operation on a
//! socket whose device has been freed fails with a use-after-free error
//! instead of handing a stale device handle to native code.
//!
//! ## Main components
//!
//! - `TcpSocket`, `UdpSocket`, `IcmpSocket`, `DnsSocket`/`DnsQuery`: one
//!   submodule per protocol.

pub mod dns;
pub mod icmp;
pub mod tcp;
pub mod udp;

pub use dns::{DnsQuery, DnsSocket};
pub use icmp::{IcmpSocket, build_echo_packet};
pub use tcp::TcpSocket;
pub use udp::UdpSocket;

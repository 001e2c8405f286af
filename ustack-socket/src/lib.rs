//! # ustack-socket
//!
//! Safe binding layer for an embedded user-space TCP/IP protocol engine.
//!
//! The engine does the protocol work (parsing, retransmission, congestion
//! control, checksums, neighbour discovery, fragment reassembly) behind an
//! opaque handle ABI; this crate turns that ABI into a memory-safe resource
//! lifecycle -- builder consumed into device, device owning its interface
//! handle, sockets freed independently -- plus an exact binary codec for
//! addresses, endpoints, interfaces and MACs.
//!
//! Everything is single-threaded and synchronous: operations complete or
//! fail immediately, `Device::poll` is the only call that advances protocol
//! time, and a device with its sockets belongs to one owner for its whole
//! lifetime.

// Public modules and re-exports
pub mod addr;
pub mod builder;
pub mod device;
pub mod engine;
pub mod error;
pub mod handle;
pub mod socket;

pub use addr::{CAddress, CEndpoint, CInterface, CMacAddress, address_from_wire, mac_from_wire};
pub use builder::{DeviceBuilder, make_device, make_l2_device, make_l3_device};
pub use device::Device;
pub use engine::{EchoKind, Engine, ErrorCode, Medium};
pub use error::{Error, Result};
pub use handle::{HandleSlot, NULL_HANDLE, RawHandle};
pub use socket::{DnsQuery, DnsSocket, IcmpSocket, TcpSocket, UdpSocket, build_echo_packet};

// The native engine binding, only meaningful when the engine library is
// linked into the final binary.
#[cfg(feature = "native")]
pub mod ffi;

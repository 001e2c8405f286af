//! # Engine ABI Surface
//!
//! ## Purpose
//!
//! This module defines the seam between the safe binding layer and the
//! embedded TCP/IP protocol engine. The engine is an opaque collaborator: it
//! parses packets, runs retransmission and congestion control, computes
//! checksums, and does neighbour discovery, all behind a fixed set of
//! handle-taking entry points.
//!
//! ## How it works
//!
//! The `Engine` trait mirrors the native ABI one method per entry point,
//! exchanging only raw handles, `#[repr(C)]` wire structs and byte slices.
//! The wrappers in `builder`, `device` and `socket` never hold engine state
//! themselves; they own handles and route every call through this trait.
//! The `ffi` module (cargo feature `native`) implements the trait over the
//! real `extern "C"` symbols, and the test suite implements it with an
//! in-process mock.
//!
//! ## Main components
//!
//! - `Engine`: the full ABI surface, grouped builder / device / tcp / udp /
//!   icmp / dns.
//! - `ErrorCode`: the closed status-code taxonomy returned by the engine.
//! - `Medium`: the link-layer mode a device operates in.
//! - `EchoKind`: ICMP echo packet discriminator.

use crate::addr::{CAddress, CEndpoint, CInterface, CMacAddress};
use crate::handle::RawHandle;
use std::fmt;

/// The link-layer mode a device operates in.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Invalid = 0,
    Ethernet = 2,
    Ip = 3,
    Ieee802154 = 4,
}

/// ICMP echo packet type passed to the echo packet builder.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoKind {
    EchoRequest = 1,
    EchoReply = 2,
}

/// Status codes returned by the engine.
///
/// The taxonomy is closed on the engine side; the binding surfaces every
/// non-OK code verbatim inside a typed error and never retries internally.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    OK = 0,
    Exhausted = 1,
    Illegal = 2,
    Unaddressable = 3,
    Finished = 4,
    Truncated = 5,
    Checksum = 6,
    Unrecognized = 7,
    Fragmented = 8,
    Malformed = 9,
    Dropped = 10,
    ReassemblyTimeout = 11,
    PacketAssemblerNotInit = 12,
    PacketAssemblerBufferTooSmall = 13,
    PacketAssemblerIncomplete = 14,
    PacketAssemblerTooManyHoles = 15,
    PacketAssemblerOverlap = 16,
    PacketAssemblerSetFull = 17,
    PacketAssemblerSetKeyNotFound = 18,
    NotSupported = 19,
    InvalidState = 20,
    BufferFull = 21,
    NoFreeSlot = 22,
    InvalidName = 23,
    NameTooLong = 24,
    Pending = 25,
    Failed = 26,
    BufferInsufficient = 255,
}

impl ErrorCode {
    /// Decodes a raw status byte coming over the ABI.
    ///
    /// An unknown value is folded into `Failed` after a warning; the taxonomy
    /// is closed, so this only fires on an engine/binding version mismatch.
    pub fn from_raw(code: u8) -> ErrorCode {
        match code {
            0 => ErrorCode::OK,
            1 => ErrorCode::Exhausted,
            2 => ErrorCode::Illegal,
            3 => ErrorCode::Unaddressable,
            4 => ErrorCode::Finished,
            5 => ErrorCode::Truncated,
            6 => ErrorCode::Checksum,
            7 => ErrorCode::Unrecognized,
            8 => ErrorCode::Fragmented,
            9 => ErrorCode::Malformed,
            10 => ErrorCode::Dropped,
            11 => ErrorCode::ReassemblyTimeout,
            12 => ErrorCode::PacketAssemblerNotInit,
            13 => ErrorCode::PacketAssemblerBufferTooSmall,
            14 => ErrorCode::PacketAssemblerIncomplete,
            15 => ErrorCode::PacketAssemblerTooManyHoles,
            16 => ErrorCode::PacketAssemblerOverlap,
            17 => ErrorCode::PacketAssemblerSetFull,
            18 => ErrorCode::PacketAssemblerSetKeyNotFound,
            19 => ErrorCode::NotSupported,
            20 => ErrorCode::InvalidState,
            21 => ErrorCode::BufferFull,
            22 => ErrorCode::NoFreeSlot,
            23 => ErrorCode::InvalidName,
            24 => ErrorCode::NameTooLong,
            25 => ErrorCode::Pending,
            26 => ErrorCode::Failed,
            255 => ErrorCode::BufferInsufficient,
            other => {
                log::warn!("unknown engine status code {other}");
                ErrorCode::Failed
            }
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::OK
    }

    /// Capacity-exceeded and in-progress codes; the caller may retry later
    /// or reduce load. Everything else non-OK is a protocol-level rejection
    /// or a state error.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            ErrorCode::Exhausted
                | ErrorCode::BufferFull
                | ErrorCode::NoFreeSlot
                | ErrorCode::Pending
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (code {})", self, *self as u8)
    }
}

/// The native ABI surface consumed by the binding layer.
///
/// Each method corresponds to exactly one engine entry point and exchanges
/// only opaque handles and wire structs. Implementations are not expected to
/// validate handles; handle bookkeeping is the wrappers' job, and passing a
/// stale handle through this trait is the exact failure the `HandleSlot`
/// rules exist to prevent.
///
/// Every operation is synchronous and none of them suspend; see the crate
/// docs for the single-owner threading model.
pub trait Engine {
    /// Probes whether the optional 6LoWPAN capability is compiled into the
    /// engine. Feature absence is a first-class outcome, not a link failure.
    fn supports_sixlowpan(&self) -> bool {
        false
    }

    // Builder entry points. Each configuration call consumes the passed
    // builder handle and returns its replacement; only `builder_free`
    // destroys one outright.
    fn builder_new(&self) -> RawHandle;
    fn builder_free(&self, builder: RawHandle);
    fn builder_set_hardware_addr(&self, builder: RawHandle, mac: CMacAddress) -> RawHandle;
    fn builder_init_neighbour_cache(&self, builder: RawHandle) -> RawHandle;
    /// Engines without the 6LoWPAN capability answer with the null handle.
    fn builder_init_sixlowpan(&self, builder: RawHandle) -> RawHandle;
    fn builder_init_ipv4_fragments(&self, builder: RawHandle) -> RawHandle;
    fn builder_set_ip_addr(&self, builder: RawHandle, addr: CInterface) -> RawHandle;
    fn builder_set_routes(&self, builder: RawHandle, gateway: CAddress) -> RawHandle;
    fn builder_finalize(&self, builder: RawHandle, medium: Medium, mtu: usize) -> RawHandle;

    // Device entry points.
    fn device_free(&self, device: RawHandle);
    fn device_poll(&self, device: RawHandle);
    fn device_tx_queue_len(&self, device: RawHandle) -> usize;
    fn device_last_tx_size(&self, device: RawHandle) -> usize;
    fn device_pop_tx(&self, device: RawHandle, dst: &mut [u8]) -> usize;
    fn device_push_rx(&self, device: RawHandle, src: &[u8]);

    // TCP socket entry points.
    fn tcp_new(&self, device: RawHandle) -> RawHandle;
    fn tcp_free(&self, socket: RawHandle);
    fn tcp_connect(
        &self,
        device: RawHandle,
        socket: RawHandle,
        remote: CEndpoint,
        local_port: u16,
    ) -> ErrorCode;
    fn tcp_listen(&self, device: RawHandle, socket: RawHandle, port: u16);
    fn tcp_send(&self, device: RawHandle, socket: RawHandle, data: &[u8]);
    fn tcp_receive(&self, device: RawHandle, socket: RawHandle, dst: &mut [u8]);
    fn tcp_is_active(&self, device: RawHandle, socket: RawHandle) -> bool;

    // UDP socket entry points.
    fn udp_new(&self, device: RawHandle) -> RawHandle;
    fn udp_free(&self, socket: RawHandle);
    fn udp_bind(&self, device: RawHandle, socket: RawHandle, port: u16) -> ErrorCode;
    fn udp_send(
        &self,
        device: RawHandle,
        socket: RawHandle,
        remote: CEndpoint,
        data: &[u8],
    ) -> ErrorCode;
    fn udp_last_rx_size(&self, device: RawHandle, socket: RawHandle) -> usize;
    fn udp_receive(
        &self,
        device: RawHandle,
        socket: RawHandle,
        from: &mut CEndpoint,
        dst: &mut [u8],
    ) -> ErrorCode;

    // ICMP socket entry points.
    fn icmp_new(&self, device: RawHandle) -> RawHandle;
    fn icmp_free(&self, socket: RawHandle);
    fn icmp_bind_any(&self, device: RawHandle, socket: RawHandle) -> ErrorCode;
    fn icmp_bind_ident(&self, device: RawHandle, socket: RawHandle, ident: u16) -> ErrorCode;
    fn icmp_bind_udp(
        &self,
        device: RawHandle,
        socket: RawHandle,
        endpoint: CEndpoint,
    ) -> ErrorCode;
    fn icmp_send(
        &self,
        device: RawHandle,
        socket: RawHandle,
        to: CAddress,
        data: &[u8],
    ) -> ErrorCode;
    fn icmp_receive(
        &self,
        device: RawHandle,
        socket: RawHandle,
        from: &mut CAddress,
        dst: &mut [u8],
    ) -> ErrorCode;
    /// Two-phase echo builder: with `dst == None` the call returns the
    /// required packet size; with a buffer it fills the packet and returns a
    /// status, zero meaning success.
    fn icmp_build_echo(
        &self,
        kind: EchoKind,
        ident: u16,
        seq_no: u16,
        payload: &[u8],
        dst: Option<&mut [u8]>,
    ) -> u32;

    // DNS entry points. Queries go through their own creation entry point,
    // never through socket creation.
    fn dns_socket_new(&self, device: RawHandle, server: CAddress) -> RawHandle;
    fn dns_socket_free(&self, socket: RawHandle);
    fn dns_query_new(&self, device: RawHandle, socket: RawHandle, name: &[u8]) -> RawHandle;
}

//! # Error Types
//!
//! ## Purpose
//!
//! This module defines the single error type used across the binding layer,
//! covering both local lifecycle violations (null allocations, use after
//! free) and engine status codes surfaced by socket operations.
//!
//! ## How it works
//!
//! Lifecycle errors carry a short static tag naming the resource kind, so a
//! failure reads like "builder used after free" without any allocation on the
//! error path. Engine rejections carry the raw `ErrorCode` verbatim; the
//! binding never retries and never maps a non-OK code to a default value.

use crate::engine::ErrorCode;
use thiserror::Error;

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The engine returned a null handle where a live resource was expected.
    #[error("engine returned a null {0} handle")]
    Allocation(&'static str),

    /// A wrapper was used after its handle had been released.
    #[error("{0} used after free")]
    UseAfterFree(&'static str),

    /// A packed address was neither 16 nor 4 bytes long.
    #[error("invalid packed address length: {0}")]
    AddressLength(usize),

    /// A packed MAC address was not exactly 6 bytes long.
    #[error("invalid packed MAC address length: {0}")]
    MacLength(usize),

    /// A wire interface decoded to IPv4 but its prefix was shorter than the
    /// 96-bit mapping prefix, which would yield a negative logical prefix.
    #[error("wire prefix {0} is shorter than the 96-bit IPv4 mapping prefix")]
    PrefixUnderflow(u8),

    /// A prefix length was out of range for the decoded address family.
    #[error("prefix length out of range")]
    PrefixLen(#[from] ipnet::PrefixLenError),

    /// An optional engine capability is absent. Distinct from a hard failure
    /// so callers can probe for it.
    #[error("engine does not support {0}")]
    NotSupported(&'static str),

    /// The engine rejected a TCP connect.
    #[error("tcp connect failed: {0}")]
    Connect(ErrorCode),

    /// The engine rejected a bind.
    #[error("bind failed: {0}")]
    Bind(ErrorCode),

    /// The engine rejected a send.
    #[error("send failed: {0}")]
    Send(ErrorCode),

    /// The engine rejected a receive.
    #[error("receive failed: {0}")]
    Receive(ErrorCode),

    /// The fill phase of an ICMP echo build returned a non-zero status.
    #[error("echo packet build failed: status {0}")]
    EchoBuild(u32),
}

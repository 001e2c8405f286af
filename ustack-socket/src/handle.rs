//! # Single-Owner Handle Slot
//!
//! ## Purpose
//!
//! This module provides `HandleSlot`, the one place where raw engine handles
//! are stored. Every wrapper in the crate (builder, device, sockets) keeps
//! its native handle in a slot, which enforces the lifecycle rules: a handle
//! is owned by exactly one slot, it leaves the slot at most once, and any use
//! after that fails fast instead of passing a stale handle to native code.
//!
//! ## How it works
//!
//! The slot is a `Cell<RawHandle>` where zero means "empty". `acquire`
//! rejects a null handle up front, so an allocation failure is reported at
//! construction and an empty wrapper can never be built by accident. `take`
//! swaps the slot to empty and hands the handle out exactly once; owners call
//! the matching engine destructor with that value, both from an explicit
//! `free` and from `Drop`, and the swap makes the second path a no-op.
//!
//! ## Main components
//!
//! - `RawHandle`, `NULL_HANDLE`: the opaque handle representation.
//! - `HandleSlot`: the single-owner slot with free-once take semantics.

use crate::error::{Error, Result};
use std::cell::Cell;

/// An opaque handle value exchanged with the engine.
///
/// Handles are meaningless integers outside the engine; the only thing the
/// binding layer knows about them is that zero is the null handle.
pub type RawHandle = usize;

/// The null handle, returned by the engine when an allocation fails.
pub const NULL_HANDLE: RawHandle = 0;

/// A single-owner slot holding one live engine handle, or nothing.
///
/// The static tag names the resource kind ("builder", "device", ...) so
/// lifecycle errors identify what was misused.
pub struct HandleSlot {
    raw: Cell<RawHandle>,
    what: &'static str,
}

impl HandleSlot {
    /// Wraps a handle freshly returned by the engine.
    ///
    /// A null handle means the engine failed to allocate the resource and is
    /// reported as `Error::Allocation` right here, so a slot is live from the
    /// moment it exists.
    pub fn acquire(raw: RawHandle, what: &'static str) -> Result<Self> {
        if raw == NULL_HANDLE {
            return Err(Error::Allocation(what));
        }
        Ok(HandleSlot {
            raw: Cell::new(raw),
            what,
        })
    }

    /// Returns the held handle for use in an engine call.
    ///
    /// Fails with `Error::UseAfterFree` if the handle has already been taken.
    pub fn get(&self) -> Result<RawHandle> {
        match self.raw.get() {
            NULL_HANDLE => Err(Error::UseAfterFree(self.what)),
            raw => Ok(raw),
        }
    }

    /// Empties the slot and returns the handle, if it was still live.
    ///
    /// This is the only way a handle leaves a slot, which makes "destructor
    /// invoked at most once" hold by construction: a second `take` sees the
    /// empty slot and returns `None`.
    pub fn take(&self) -> Option<RawHandle> {
        match self.raw.replace(NULL_HANDLE) {
            NULL_HANDLE => None,
            raw => Some(raw),
        }
    }

    /// Like `take`, but an already-empty slot is an error.
    ///
    /// Used where consuming the handle is part of the operation itself, such
    /// as the builder's replace-per-call steps.
    pub fn take_live(&self) -> Result<RawHandle> {
        self.take().ok_or(Error::UseAfterFree(self.what))
    }

    /// Stores a replacement handle into an emptied slot.
    ///
    /// A null replacement means the engine call that was supposed to produce
    /// the new handle failed; the slot stays empty and the failure is
    /// reported as `Error::Allocation`.
    pub fn put(&self, raw: RawHandle) -> Result<()> {
        if raw == NULL_HANDLE {
            return Err(Error::Allocation(self.what));
        }
        self.raw.set(raw);
        Ok(())
    }

    /// Whether the slot still holds a live handle.
    pub fn is_live(&self) -> bool {
        self.raw.get() != NULL_HANDLE
    }
}

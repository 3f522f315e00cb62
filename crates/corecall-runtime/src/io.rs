//! Shared memory access trait.
//!
//! The runtime never touches the shared window directly: every access
//! goes through [`SharedMem`], so the same channel code runs over a
//! memory-mapped window, a debug-probe link, or an in-process buffer in
//! tests. Offsets are relative to the start of the window; the
//! implementation owns the translation to physical addresses.

use std::time::Duration;

use crate::error::CallResult;

/// Byte-level access to the shared window plus the response doorbell.
///
/// `read`/`write` need no atomicity beyond single-`u32` cursor accesses:
/// each 4-byte-aligned 4-byte access must be indivisible, which every
/// mapped-memory backend provides naturally.
pub trait SharedMem {
    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> CallResult<()>;

    /// Write `data` starting at `offset`.
    fn write(&mut self, offset: u32, data: &[u8]) -> CallResult<()>;

    /// Block until the peer raises the response doorbell or `timeout`
    /// lapses. Returns `false` on timeout. A polling backend may simply
    /// sleep a short interval and return `true`.
    fn wait_for_interrupt(&mut self, timeout: Duration) -> CallResult<bool>;

    /// Acknowledge the doorbell. Called only after a wake was observed,
    /// so a level-triggered backend never loses an edge.
    fn clear_interrupt(&mut self) -> CallResult<()>;
}

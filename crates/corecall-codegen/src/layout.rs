//! Target memory layout: where the two mailbox rings and the shared data
//! window live in the embedded address space.

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, CodegenResult};

/// Ring header size: a `u32` write cursor plus a `u32` read cursor.
pub const RING_HEADER_BYTES: u32 = 8;

/// Physical placement of the transport in the embedded address space.
///
/// Each direction is one ring of `ring_capacity` bytes: an 8-byte cursor
/// header followed by the data window. One data byte is always left
/// unused so a full ring and an empty ring are distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetLayout {
    /// Base of the host-to-embedded (command) ring.
    pub cmd_base: u32,
    /// Base of the embedded-to-host (response) ring.
    pub resp_base: u32,
    /// Total bytes per ring, header included.
    pub ring_capacity: u32,
    /// Base address OR'd into every `void *` argument on the host side.
    pub void_ptr_base: u32,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            cmd_base: 0x4100_0000,
            resp_base: 0x4100_1000,
            ring_capacity: 0x1000,
            void_ptr_base: 0x4200_0000,
        }
    }
}

impl TargetLayout {
    /// Data bytes per ring, cursor header excluded.
    pub fn data_bytes(&self) -> u32 {
        self.ring_capacity.saturating_sub(RING_HEADER_BYTES)
    }

    /// Check the layout is usable: rings must hold at least one data byte
    /// past the slack byte, and must not overlap each other.
    pub fn validate(&self) -> CodegenResult<()> {
        if self.data_bytes() < 2 {
            return Err(CodegenError::Layout(format!(
                "ring capacity {} leaves no usable data window",
                self.ring_capacity
            )));
        }
        let (lo, hi) = if self.cmd_base <= self.resp_base {
            (self.cmd_base, self.resp_base)
        } else {
            (self.resp_base, self.cmd_base)
        };
        if hi - lo < self.ring_capacity {
            return Err(CodegenError::Layout(format!(
                "command and response rings overlap: bases {:#010x} and {:#010x}, capacity {}",
                self.cmd_base, self.resp_base, self.ring_capacity
            )));
        }
        Ok(())
    }
}

//! Bidirectional call transport: one command ring out, one response
//! ring back, over a single shared memory window.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CallError, CallResult};
use crate::io::SharedMem;
use crate::mailbox::{Mailbox, Role, Wait, HEADER_BYTES};

/// Placement of the two rings inside the shared window, plus call
/// behaviour knobs. Offsets are window-relative; the [`SharedMem`]
/// backend maps them onto the target address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Offset of the host-to-target command ring.
    pub cmd_offset: u32,
    /// Offset of the target-to-host response ring.
    pub resp_offset: u32,
    /// Total bytes per ring, cursor header included.
    pub ring_capacity: u32,
    /// Base address OR'd into every `void *` argument before it goes on
    /// the wire.
    pub void_ptr_base: u32,
    /// How long one call may wait for its complete response.
    pub reply_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            cmd_offset: 0,
            resp_offset: 0x1000,
            ring_capacity: 0x1000,
            void_ptr_base: 0x4200_0000,
            reply_timeout_ms: 1_000,
        }
    }
}

impl ChannelConfig {
    fn validate(&self) -> CallResult<()> {
        if self.ring_capacity <= HEADER_BYTES + 1 {
            return Err(CallError::Transport(format!(
                "ring capacity {} leaves no usable data window",
                self.ring_capacity
            )));
        }
        let (lo, hi) = if self.cmd_offset <= self.resp_offset {
            (self.cmd_offset, self.resp_offset)
        } else {
            (self.resp_offset, self.cmd_offset)
        };
        if hi - lo < self.ring_capacity {
            return Err(CallError::Transport(format!(
                "command and response rings overlap: offsets {:#x} and {:#x}, capacity {}",
                self.cmd_offset, self.resp_offset, self.ring_capacity
            )));
        }
        Ok(())
    }
}

/// The host end of the link. Owns the shared memory backend; the
/// mailboxes borrow it per operation.
pub struct Channel {
    mem: Box<dyn SharedMem>,
    cmd: Mailbox,
    resp: Mailbox,
    config: ChannelConfig,
}

impl Channel {
    /// Open the link and zero all four cursors. The dispatcher must not
    /// be serving yet when this runs.
    pub fn new(mem: Box<dyn SharedMem>, config: ChannelConfig) -> CallResult<Self> {
        config.validate()?;
        let cmd = Mailbox::new(config.cmd_offset, config.ring_capacity, Role::Producer);
        let resp = Mailbox::new(config.resp_offset, config.ring_capacity, Role::Consumer);
        let mut channel = Self {
            mem,
            cmd,
            resp,
            config,
        };
        channel.cmd.reset(channel.mem.as_mut())?;
        channel.resp.reset(channel.mem.as_mut())?;
        debug!(
            "channel open: cmd at {:#x}, resp at {:#x}, {} bytes usable per ring",
            channel.config.cmd_offset,
            channel.config.resp_offset,
            channel.cmd.usable()
        );
        Ok(channel)
    }

    /// A deadline spanning one whole call.
    pub fn wait(&self) -> Wait {
        Wait::for_ms(self.config.reply_timeout_ms)
    }

    pub fn void_ptr_base(&self) -> u32 {
        self.config.void_ptr_base
    }

    /// Send one complete command frame.
    pub fn send(&mut self, bytes: &[u8], wait: Wait) -> CallResult<()> {
        self.cmd.write_all(self.mem.as_mut(), bytes, wait)
    }

    pub fn read_u8(&mut self, wait: Wait) -> CallResult<u8> {
        self.resp.read_u8(self.mem.as_mut(), wait)
    }

    pub fn read_u16(&mut self, wait: Wait) -> CallResult<u16> {
        self.resp.read_u16(self.mem.as_mut(), wait)
    }

    pub fn read_vec(&mut self, len: usize, wait: Wait) -> CallResult<Vec<u8>> {
        self.resp.read_vec(self.mem.as_mut(), len, wait)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

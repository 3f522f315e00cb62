//! One circular byte ring in the shared window.
//!
//! Layout: a `u32` write cursor at the base, a `u32` read cursor at
//! base + 4, data from base + 8. Cursors index into the data region and
//! one data byte is always left unused, so a full ring and an empty
//! ring are distinguishable without a separate count field.
//!
//! Each side owns exactly one cursor. The peer's cursor is re-read
//! until two consecutive reads agree before it is trusted, which guards
//! against catching a non-atomic update mid-flight on slower links.

use std::time::{Duration, Instant};

use log::trace;

use crate::error::{CallError, CallResult};
use crate::io::SharedMem;

/// Ring header size: write cursor plus read cursor.
pub const HEADER_BYTES: u32 = 8;

/// How often a producer re-polls a full ring.
const FULL_POLL: Duration = Duration::from_millis(1);

/// Attempts before a remote cursor is declared unstable.
const STABLE_ATTEMPTS: u32 = 64;

/// A call deadline: one `Wait` spans every ring operation of one call,
/// so a slow multi-frame response cannot stretch the timeout.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    deadline: Instant,
    timeout_ms: u64,
}

impl Wait {
    pub fn for_ms(timeout_ms: u64) -> Self {
        Self {
            deadline: Instant::now() + Duration::from_millis(timeout_ms),
            timeout_ms,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    fn timeout(&self) -> CallError {
        CallError::Timeout(self.timeout_ms)
    }
}

/// Which cursor this side owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

/// One direction of the transport. Holds only geometry; every access
/// goes through the [`SharedMem`] handed in per operation.
#[derive(Debug, Clone)]
pub struct Mailbox {
    base: u32,
    data_len: u32,
    role: Role,
}

impl Mailbox {
    /// `capacity` is the total ring size, header included.
    pub fn new(base: u32, capacity: u32, role: Role) -> Self {
        Self {
            base,
            data_len: capacity.saturating_sub(HEADER_BYTES),
            role,
        }
    }

    /// Usable bytes: one below the data window, see the module docs.
    pub fn usable(&self) -> u32 {
        self.data_len.saturating_sub(1)
    }

    /// Zero both cursors. Done once by the host before the first call.
    pub fn reset(&self, mem: &mut dyn SharedMem) -> CallResult<()> {
        store_u32(mem, self.base, 0)?;
        store_u32(mem, self.base + 4, 0)
    }

    /// Bytes buffered and not yet consumed.
    pub fn buffered(&self, mem: &mut dyn SharedMem) -> CallResult<u32> {
        let (write, read) = self.cursors(mem)?;
        Ok(if write >= read {
            write - read
        } else {
            write + self.data_len - read
        })
    }

    /// Bytes a producer can still write.
    pub fn space(&self, mem: &mut dyn SharedMem) -> CallResult<u32> {
        Ok(self.usable() - self.buffered(mem)?)
    }

    // ── Producer ──────────────────────────────────────────────────────────────

    /// Write as much as fits right now and return the count. A short
    /// write never disturbs data the consumer has not read yet; the
    /// cursor advances only behind bytes already in place.
    pub fn write(&self, mem: &mut dyn SharedMem, bytes: &[u8]) -> CallResult<usize> {
        debug_assert_eq!(self.role, Role::Producer);
        let chunk = (self.space(mem)? as usize).min(bytes.len());
        if chunk == 0 {
            return Ok(0);
        }
        let write = self.local(mem)?;
        self.copy_in(mem, write, &bytes[..chunk])?;
        store_u32(mem, self.base, (write + chunk as u32) % self.data_len)?;
        Ok(chunk)
    }

    /// Write every byte, polling when the ring is full.
    pub fn write_all(
        &self,
        mem: &mut dyn SharedMem,
        mut bytes: &[u8],
        wait: Wait,
    ) -> CallResult<()> {
        while !bytes.is_empty() {
            let written = self.write(mem, bytes)?;
            bytes = &bytes[written..];
            if written == 0 {
                if wait.expired() {
                    return Err(wait.timeout());
                }
                std::thread::sleep(FULL_POLL);
            }
        }
        Ok(())
    }

    pub fn write_u32(&self, mem: &mut dyn SharedMem, value: u32, wait: Wait) -> CallResult<()> {
        self.write_all(mem, &value.to_le_bytes(), wait)
    }

    // ── Consumer ──────────────────────────────────────────────────────────────

    /// Read up to `buf.len()` bytes without waiting; returns the count.
    pub fn read_some(&self, mem: &mut dyn SharedMem, buf: &mut [u8]) -> CallResult<usize> {
        debug_assert_eq!(self.role, Role::Consumer);
        let chunk = (self.buffered(mem)? as usize).min(buf.len());
        if chunk == 0 {
            return Ok(0);
        }
        let read = self.local(mem)?;
        self.copy_out(mem, read, &mut buf[..chunk])?;
        store_u32(mem, self.base + 4, (read + chunk as u32) % self.data_len)?;
        Ok(chunk)
    }

    /// Fill `buf` completely, suspending whenever the ring runs dry.
    pub fn read_exact(
        &self,
        mem: &mut dyn SharedMem,
        buf: &mut [u8],
        wait: Wait,
    ) -> CallResult<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            let got = self.read_some(mem, &mut buf[filled..])?;
            filled += got;
            if got == 0 {
                self.wait_until_data(mem, wait)?;
            }
        }
        Ok(())
    }

    /// The single suspension point. The doorbell is acknowledged only
    /// after a wake was observed, so an edge raised between the empty
    /// check and the wait is never lost.
    fn wait_until_data(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<()> {
        loop {
            if self.buffered(mem)? > 0 {
                return Ok(());
            }
            if wait.expired() {
                return Err(wait.timeout());
            }
            trace!("ring at {:#x} empty, waiting", self.base);
            if mem.wait_for_interrupt(wait.remaining())? {
                mem.clear_interrupt()?;
            }
        }
    }

    pub fn read_u8(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<u8> {
        let mut b = [0u8; 1];
        self.read_exact(mem, &mut b, wait)?;
        Ok(b[0])
    }

    pub fn read_u16(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<u16> {
        let mut b = [0u8; 2];
        self.read_exact(mem, &mut b, wait)?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn read_u32(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<u32> {
        let mut b = [0u8; 4];
        self.read_exact(mem, &mut b, wait)?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn read_f32(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<f32> {
        let mut b = [0u8; 4];
        self.read_exact(mem, &mut b, wait)?;
        Ok(f32::from_le_bytes(b))
    }

    pub fn read_vec(&self, mem: &mut dyn SharedMem, len: usize, wait: Wait) -> CallResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(mem, &mut buf, wait)?;
        Ok(buf)
    }

    /// A `u16` length prefix followed by that many raw bytes.
    pub fn read_str(&self, mem: &mut dyn SharedMem, wait: Wait) -> CallResult<Vec<u8>> {
        let len = self.read_u16(mem, wait)? as usize;
        self.read_vec(mem, len, wait)
    }

    // ── Cursor access ─────────────────────────────────────────────────────────

    /// `(write, read)` cursor pair, the remote one stabilised.
    fn cursors(&self, mem: &mut dyn SharedMem) -> CallResult<(u32, u32)> {
        match self.role {
            Role::Producer => Ok((self.local(mem)?, self.stable_remote(mem, self.base + 4)?)),
            Role::Consumer => Ok((self.stable_remote(mem, self.base)?, self.local(mem)?)),
        }
    }

    fn local(&self, mem: &mut dyn SharedMem) -> CallResult<u32> {
        let offset = match self.role {
            Role::Producer => self.base,
            Role::Consumer => self.base + 4,
        };
        load_u32(mem, offset)
    }

    fn stable_remote(&self, mem: &mut dyn SharedMem, offset: u32) -> CallResult<u32> {
        let mut last = load_u32(mem, offset)?;
        for _ in 0..STABLE_ATTEMPTS {
            let again = load_u32(mem, offset)?;
            if again == last {
                if again >= self.data_len {
                    return Err(CallError::Protocol(format!(
                        "cursor {again} out of range for a {}-byte ring",
                        self.data_len
                    )));
                }
                return Ok(again);
            }
            last = again;
        }
        Err(CallError::Protocol(format!(
            "cursor at {offset:#x} never stabilised"
        )))
    }

    // ── Data window ───────────────────────────────────────────────────────────

    fn copy_in(&self, mem: &mut dyn SharedMem, at: u32, bytes: &[u8]) -> CallResult<()> {
        let tail_room = (self.data_len - at) as usize;
        let first = tail_room.min(bytes.len());
        mem.write(self.base + HEADER_BYTES + at, &bytes[..first])?;
        if first < bytes.len() {
            mem.write(self.base + HEADER_BYTES, &bytes[first..])?;
        }
        Ok(())
    }

    fn copy_out(&self, mem: &mut dyn SharedMem, at: u32, buf: &mut [u8]) -> CallResult<()> {
        let tail_room = (self.data_len - at) as usize;
        let first = tail_room.min(buf.len());
        mem.read(self.base + HEADER_BYTES + at, &mut buf[..first])?;
        if first < buf.len() {
            mem.read(self.base + HEADER_BYTES, &mut buf[first..])?;
        }
        Ok(())
    }
}

fn load_u32(mem: &mut dyn SharedMem, offset: u32) -> CallResult<u32> {
    let mut b = [0u8; 4];
    mem.read(offset, &mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn store_u32(mem: &mut dyn SharedMem, offset: u32, value: u32) -> CallResult<()> {
    mem.write(offset, &value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct VecMem(Vec<u8>);

    impl SharedMem for VecMem {
        fn read(&mut self, offset: u32, buf: &mut [u8]) -> CallResult<()> {
            let at = offset as usize;
            buf.copy_from_slice(&self.0[at..at + buf.len()]);
            Ok(())
        }

        fn write(&mut self, offset: u32, data: &[u8]) -> CallResult<()> {
            let at = offset as usize;
            self.0[at..at + data.len()].copy_from_slice(data);
            Ok(())
        }

        fn wait_for_interrupt(&mut self, _timeout: Duration) -> CallResult<bool> {
            Ok(true)
        }

        fn clear_interrupt(&mut self) -> CallResult<()> {
            Ok(())
        }
    }

    fn pair(capacity: u32) -> (Mailbox, Mailbox, VecMem) {
        let producer = Mailbox::new(0, capacity, Role::Producer);
        let consumer = Mailbox::new(0, capacity, Role::Consumer);
        let mut mem = VecMem(vec![0u8; capacity as usize]);
        producer.reset(&mut mem).unwrap();
        (producer, consumer, mem)
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let (tx, rx, mut mem) = pair(8 + 16);
        let wait = Wait::for_ms(50);
        tx.write_all(&mut mem, b"hello ring", wait).unwrap();
        assert_eq!(rx.buffered(&mut mem).unwrap(), 10);
        let got = rx.read_vec(&mut mem, 10, wait).unwrap();
        assert_eq!(&got, b"hello ring");
        assert_eq!(rx.buffered(&mut mem).unwrap(), 0);
    }

    #[test]
    fn test_wrap_around() {
        // 5 data bytes, 4 usable: every second write wraps.
        let (tx, rx, mut mem) = pair(8 + 5);
        let wait = Wait::for_ms(50);
        for round in 0u8..10 {
            let chunk = [round, round.wrapping_add(1), round.wrapping_add(2)];
            tx.write_all(&mut mem, &chunk, wait).unwrap();
            let got = rx.read_vec(&mut mem, 3, wait).unwrap();
            assert_eq!(got, chunk);
        }
    }

    #[test]
    fn test_full_ring_times_out_without_consumer() {
        let (tx, rx, mut mem) = pair(8 + 5);
        let wait = Wait::for_ms(5);
        let err = tx.write_all(&mut mem, b"too much data", wait).unwrap_err();
        assert!(matches!(err, CallError::Timeout(5)));
        // The usable prefix landed intact.
        assert_eq!(tx.space(&mut mem).unwrap(), 0);
        let got = rx.read_vec(&mut mem, 4, Wait::for_ms(5)).unwrap();
        assert_eq!(&got, b"too ");
    }

    #[test]
    fn test_short_write_reports_count_and_keeps_buffered_data() {
        let (tx, rx, mut mem) = pair(8 + 5);
        assert_eq!(tx.write(&mut mem, b"ab").unwrap(), 2);
        // 4 usable, 2 buffered: only 2 of the next 5 fit.
        assert_eq!(tx.write(&mut mem, b"cdefg").unwrap(), 2);
        assert_eq!(tx.write(&mut mem, b"efg").unwrap(), 0);
        let got = rx.read_vec(&mut mem, 4, Wait::for_ms(5)).unwrap();
        assert_eq!(&got, b"abcd");
    }

    #[test]
    fn test_read_some_returns_what_is_available() {
        let (tx, rx, mut mem) = pair(8 + 16);
        tx.write(&mut mem, b"xyz").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(rx.read_some(&mut mem, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"xyz");
        assert_eq!(rx.read_some(&mut mem, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_str_is_length_prefixed() {
        let (tx, rx, mut mem) = pair(8 + 16);
        let wait = Wait::for_ms(50);
        tx.write_all(&mut mem, &[0x04, 0x00], wait).unwrap();
        tx.write_all(&mut mem, b"ping", wait).unwrap();
        assert_eq!(rx.read_str(&mut mem, wait).unwrap(), b"ping");
    }

    #[test]
    fn test_empty_ring_read_times_out() {
        let (_tx, rx, mut mem) = pair(8 + 16);
        let err = rx.read_u32(&mut mem, Wait::for_ms(5)).unwrap_err();
        assert!(matches!(err, CallError::Timeout(5)));
    }

    #[test]
    fn test_scalar_reads_are_little_endian() {
        let (tx, rx, mut mem) = pair(8 + 16);
        let wait = Wait::for_ms(50);
        tx.write_u32(&mut mem, 42, wait).unwrap();
        tx.write_all(&mut mem, &[0x05, 0x01], wait).unwrap();
        assert_eq!(rx.read_u32(&mut mem, wait).unwrap(), 42);
        assert_eq!(rx.read_u16(&mut mem, wait).unwrap(), 0x0105);
    }

    #[test]
    fn test_out_of_range_cursor_is_a_protocol_error() {
        let (_tx, rx, mut mem) = pair(8 + 16);
        // Corrupt the peer's write cursor.
        mem.write(0, &100u32.to_le_bytes()).unwrap();
        let err = rx.buffered(&mut mem).unwrap_err();
        assert!(matches!(err, CallError::Protocol(_)));
    }

    /// Window whose peer write cursor reads torn for the first N loads,
    /// as if the reader caught a non-atomic update mid-flight.
    struct TornCursorMem {
        inner: VecMem,
        torn_reads: u32,
    }

    impl SharedMem for TornCursorMem {
        fn read(&mut self, offset: u32, buf: &mut [u8]) -> CallResult<()> {
            if offset == 0 && buf.len() == 4 && self.torn_reads > 0 {
                self.torn_reads -= 1;
                self.inner.read(offset, buf)?;
                // Alternate between two wrong values so consecutive torn
                // reads never agree with each other.
                buf[0] = buf[0].wrapping_add(1 + (self.torn_reads % 2) as u8);
                return Ok(());
            }
            self.inner.read(offset, buf)
        }

        fn write(&mut self, offset: u32, data: &[u8]) -> CallResult<()> {
            self.inner.write(offset, data)
        }

        fn wait_for_interrupt(&mut self, timeout: Duration) -> CallResult<bool> {
            self.inner.wait_for_interrupt(timeout)
        }

        fn clear_interrupt(&mut self) -> CallResult<()> {
            self.inner.clear_interrupt()
        }
    }

    #[test]
    fn test_torn_peer_cursor_read_is_retried() {
        let (tx, rx, mem) = pair(8 + 16);
        let mut mem = TornCursorMem {
            inner: mem,
            torn_reads: 0,
        };
        let wait = Wait::for_ms(50);
        tx.write_all(&mut mem, b"steady", wait).unwrap();
        // One torn read: the stability re-read settles on the real value.
        mem.torn_reads = 1;
        let got = rx.read_vec(&mut mem, 6, wait).unwrap();
        assert_eq!(&got, b"steady");
    }

    #[test]
    fn test_cursor_that_never_settles_is_a_protocol_error() {
        let (tx, rx, mem) = pair(8 + 16);
        let mut mem = TornCursorMem {
            inner: mem,
            torn_reads: 0,
        };
        tx.write_all(&mut mem, b"x", Wait::for_ms(50)).unwrap();
        // Every read of the cursor differs from the last.
        mem.torn_reads = u32::MAX;
        let err = rx.buffered(&mut mem).unwrap_err();
        assert!(matches!(err, CallError::Protocol(_)));
    }
}

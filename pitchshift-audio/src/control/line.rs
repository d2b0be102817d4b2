//! Control channel: newline-delimited command lines from the host.

use crate::constants::SERIAL_BUFFER_SIZE;

/// Non-blocking source of complete command lines.
pub trait ControlChannel {
    /// Next complete line without its terminator, or `None` if none is ready.
    fn poll_line(&mut self) -> Option<&str>;
}

/// Assembles raw serial bytes into lines of at most `N` bytes.
///
/// Bytes are fed with [`feed`](Self::feed), which stops right after a
/// newline so at most one finished line is held at a time. Lines longer
/// than `N` are discarded through their newline; lines that are not UTF-8
/// are dropped when taken.
pub struct LineAssembler<const N: usize = SERIAL_BUFFER_SIZE> {
    buf: [u8; N],
    len: usize,
    /// Inside an over-long line; skipping to its newline.
    discarding: bool,
    /// `buf[..len]` is a finished line waiting to be taken.
    complete: bool,
    dropped: u32,
}

impl<const N: usize> LineAssembler<N> {
    pub const fn new() -> Self {
        LineAssembler {
            buf: [0; N],
            len: 0,
            discarding: false,
            complete: false,
            dropped: 0,
        }
    }

    /// Consume bytes up to and including the first newline that completes a
    /// line. Returns how many bytes were consumed; the caller re-feeds the
    /// rest after taking the line.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        if self.complete {
            return 0;
        }
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    self.len = 0;
                    self.dropped += 1;
                    continue;
                }
                self.complete = true;
                return i + 1;
            }
            if self.discarding {
                continue;
            }
            if self.len == N {
                self.discarding = true;
                continue;
            }
            self.buf[self.len] = b;
            self.len += 1;
        }
        bytes.len()
    }

    /// Take the finished line, if any.
    pub fn take_line(&mut self) -> Option<&str> {
        if !self.complete {
            return None;
        }
        self.complete = false;
        let len = core::mem::take(&mut self.len);
        if core::str::from_utf8(&self.buf[..len]).is_err() {
            self.dropped += 1;
            return None;
        }
        core::str::from_utf8(&self.buf[..len]).ok()
    }

    /// Lines discarded for length or encoding.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ControlChannel for LineAssembler<N> {
    fn poll_line(&mut self) -> Option<&str> {
        self.take_line()
    }
}

//! Command lines from stdin or a script, delivered through a lock-free queue.
//!
//! A reader thread assembles bytes into lines and pushes them into an
//! [`SpscQueue`]; the processing loop polls [`ScheduledLines`] without
//! blocking. Script lines may carry a release point:
//!
//! ```text
//! # comment
//! @100 PITCH 1.5     held until 100 blocks have been processed
//! @400 RESET
//! REVERB 0.3         released as soon as it is read
//! ```

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pitchshift_audio::constants::SERIAL_BUFFER_SIZE;
use pitchshift_audio::control::{ControlChannel, LineAssembler};
use pitchshift_audio::io::SpscQueue;

use crate::error::{HostError, Result};

pub const COMMAND_QUEUE_DEPTH: usize = 64;

pub type LineQueue = SpscQueue<ScriptLine, COMMAND_QUEUE_DEPTH>;

/// One command line and the block count it waits for.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub at_block: Option<u64>,
    pub text: String,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_script_line(raw: &str) -> Result<Option<ScriptLine>> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('@') else {
        return Ok(Some(ScriptLine {
            at_block: None,
            text: line.to_string(),
        }));
    };
    let (block, text) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| HostError::Schedule(line.to_string()))?;
    let at_block = block
        .parse()
        .map_err(|_| HostError::Schedule(line.to_string()))?;
    Ok(Some(ScriptLine {
        at_block: Some(at_block),
        text: text.trim_start().to_string(),
    }))
}

/// Start a thread feeding `reader`'s lines into `queue`. `closed` is set
/// once the input has ended and every line has been queued.
pub fn spawn_reader<R>(
    reader: R,
    queue: Arc<LineQueue>,
    closed: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("command-reader".into())
        .spawn(move || {
            read_lines(reader, &queue);
            closed.store(true, Ordering::Release);
        })
}

fn read_lines<R: Read>(mut reader: R, queue: &LineQueue) {
    let mut assembler = LineAssembler::<SERIAL_BUFFER_SIZE>::new();
    let mut buf = [0u8; 128];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "command input failed");
                break;
            }
        };
        let mut rest = &buf[..n];
        while !rest.is_empty() {
            let used = assembler.feed(rest);
            rest = &rest[used..];
            if let Some(line) = assembler.take_line() {
                forward(line, queue);
            }
        }
    }

    // Unterminated last line.
    assembler.feed(b"\n");
    if let Some(line) = assembler.take_line() {
        forward(line, queue);
    }
    if assembler.dropped() > 0 {
        tracing::warn!(dropped = assembler.dropped(), "over-long or non-UTF-8 command lines dropped");
    }
    tracing::debug!("command input closed");
}

fn forward(raw: &str, queue: &LineQueue) {
    let mut line = match parse_script_line(raw) {
        Ok(Some(line)) => line,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("{e}");
            return;
        }
    };
    loop {
        match queue.push(line) {
            Ok(()) => return,
            Err(back) => {
                line = back;
                thread::sleep(Duration::from_millis(1));
            }
        }
    }
}

/// Consumer side: releases queued lines in order once their block is due.
pub struct ScheduledLines {
    queue: Arc<LineQueue>,
    closed: Arc<AtomicBool>,
    held: Option<ScriptLine>,
    current: String,
    clock: u64,
}

impl ScheduledLines {
    pub fn new(queue: Arc<LineQueue>, closed: Arc<AtomicBool>) -> Self {
        ScheduledLines {
            queue,
            closed,
            held: None,
            current: String::new(),
            clock: 0,
        }
    }

    /// No reader attached; never yields a line.
    pub fn disconnected() -> Self {
        Self::new(Arc::new(LineQueue::new()), Arc::new(AtomicBool::new(true)))
    }

    /// Wait until the next line is held or the reader has finished.
    ///
    /// Used for scripts so `@<block>` lines are released on the block they
    /// name however fast the loop runs.
    pub fn wait_for_input(&mut self) {
        loop {
            if self.held.is_none() {
                self.held = self.queue.pop();
            }
            if self.held.is_some() {
                return;
            }
            if self.closed.load(Ordering::Acquire) {
                // The last push may have landed after the pop above.
                self.held = self.queue.pop();
                return;
            }
            thread::sleep(Duration::from_micros(200));
        }
    }

    /// Number of blocks processed once the coming tick has run.
    pub fn set_clock(&mut self, blocks: u64) {
        self.clock = blocks;
    }

    /// Lines read but not yet released.
    pub fn pending(&self) -> bool {
        self.held.is_some() || !self.queue.is_empty()
    }
}

impl ControlChannel for ScheduledLines {
    fn poll_line(&mut self) -> Option<&str> {
        if self.held.is_none() {
            self.held = self.queue.pop();
        }
        let due = self
            .held
            .as_ref()
            .is_some_and(|line| line.at_block.map_or(true, |at| at <= self.clock));
        if !due {
            return None;
        }
        self.current = self.held.take()?.text;
        Some(&self.current)
    }
}

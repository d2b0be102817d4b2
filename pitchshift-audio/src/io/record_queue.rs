//! Exit point of the pipeline.
//!
//! Finished mixer blocks land here during `update_all`; the tick loop then
//! drains them to the transport in order.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::node::AudioNode;

use super::spsc::SpscQueue;

/// 4 usable slots.
const QUEUE_SIZE: usize = 5;

/// Output stage. Sink node: 1 input, 0 outputs.
///
/// Blocks are only captured between [`start`](Self::start) and
/// [`stop`](Self::stop). A block arriving while the queue is full is dropped
/// and counted.
pub struct AudioRecordQueue {
    queue: SpscQueue<AudioBlockRef, QUEUE_SIZE>,
    recording: bool,
    overflows: AtomicU32,
}

impl AudioRecordQueue {
    /// Stopped and empty.
    pub const fn new() -> Self {
        AudioRecordQueue {
            queue: SpscQueue::new(),
            recording: false,
            overflows: AtomicU32::new(0),
        }
    }

    pub fn start(&mut self) {
        self.recording = true;
    }

    /// Stop capturing. Already queued blocks stay readable.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Oldest captured block.
    pub fn read(&self) -> Option<AudioBlockRef> {
        self.queue.pop()
    }

    pub fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Blocks lost to a full queue since the last call; resets the count.
    pub fn take_overflows(&self) -> u32 {
        self.overflows.swap(0, Ordering::AcqRel)
    }
}

impl Default for AudioRecordQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for AudioRecordQueue {
    const NUM_INPUTS: usize = 1;
    const NUM_OUTPUTS: usize = 0;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        _outputs: &mut [Option<AudioBlockMut>],
    ) {
        if !self.recording {
            return;
        }
        if let Some(ref block) = inputs[0] {
            if self.queue.push(block.clone()).is_err() {
                self.overflows.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

//! Microphone entry point of the pipeline.
//!
//! The tick loop hands each incoming block to [`AudioPlayQueue::play`]; the
//! graph's `update_all` pops one block per tick and feeds it downstream.

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::node::AudioNode;

use super::spsc::SpscQueue;

/// 4 usable slots.
const QUEUE_SIZE: usize = 5;

/// Input stage. Source node: 0 inputs, 1 output.
///
/// An empty queue leaves the output slot `None` and downstream stages see
/// silence for that tick.
pub struct AudioPlayQueue {
    queue: SpscQueue<AudioBlockMut, QUEUE_SIZE>,
}

impl AudioPlayQueue {
    pub const fn new() -> Self {
        AudioPlayQueue {
            queue: SpscQueue::new(),
        }
    }

    /// Queue a block for the next tick. Hands it back when full.
    pub fn play(&self, block: AudioBlockMut) -> Result<(), AudioBlockMut> {
        self.queue.push(block)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Default for AudioPlayQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for AudioPlayQueue {
    const NUM_INPUTS: usize = 0;
    const NUM_OUTPUTS: usize = 1;

    fn update(
        &mut self,
        _inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    ) {
        // The graph preallocated a block for us; the queued one replaces it.
        outputs[0] = self.queue.pop();
    }
}

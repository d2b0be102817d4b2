use core::ops::{Deref, DerefMut};

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::pool::POOL;

/// Exclusive handle to a pool block, held by whoever is still writing it.
///
/// Dropping the handle returns the slot to the pool.
#[derive(Debug)]
pub struct AudioBlockMut {
    slot: u8,
}

impl AudioBlockMut {
    /// Wrap a freshly allocated slot (refcount 1, no other handle).
    pub(crate) fn new(slot: u8) -> Self {
        AudioBlockMut { slot }
    }

    /// Allocate a zeroed block. Returns `None` if the pool is exhausted.
    pub fn alloc() -> Option<Self> {
        POOL.alloc().map(AudioBlockMut::new)
    }

    /// Allocate a block holding a copy of `samples`.
    ///
    /// Short input is zero-padded; anything past one block is ignored.
    pub fn alloc_from(samples: &[i16]) -> Option<Self> {
        let mut block = Self::alloc()?;
        let n = samples.len().min(AUDIO_BLOCK_SAMPLES);
        block[..n].copy_from_slice(&samples[..n]);
        Some(block)
    }

    /// Hand the block on to consumers. No copy, no refcount change.
    pub fn into_shared(self) -> AudioBlockRef {
        let slot = self.slot;
        core::mem::forget(self);
        AudioBlockRef { slot }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }
}

impl Deref for AudioBlockMut {
    type Target = [i16; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: exclusive handle to an allocated slot.
        unsafe { &(*POOL.data_ptr(self.slot)).samples }
    }
}

impl DerefMut for AudioBlockMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: exclusive handle to an allocated slot.
        unsafe { &mut (*POOL.data_ptr(self.slot)).samples }
    }
}

impl Drop for AudioBlockMut {
    fn drop(&mut self) {
        POOL.dec_ref(self.slot);
    }
}

/// Read-only handle to a finished block.
///
/// Cloning shares the slot; the block is never written again, which is what
/// lets one granular output feed both the dry and the wet path.
pub struct AudioBlockRef {
    slot: u8,
}

impl AudioBlockRef {
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Regain write access.
    ///
    /// Converts in place when this is the only handle, otherwise copies into a
    /// new block. Returns `None` if that copy cannot be allocated.
    pub fn into_mut(self) -> Option<AudioBlockMut> {
        if POOL.refcount(self.slot) == 1 {
            let slot = self.slot;
            core::mem::forget(self);
            return Some(AudioBlockMut::new(slot));
        }
        let mut copy = AudioBlockMut::alloc()?;
        copy.copy_from_slice(&self[..]);
        Some(copy)
    }
}

impl Deref for AudioBlockRef {
    type Target = [i16; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: slot is allocated and immutable while shared.
        unsafe { &(*POOL.data_ptr(self.slot)).samples }
    }
}

impl Clone for AudioBlockRef {
    fn clone(&self) -> Self {
        POOL.inc_ref(self.slot);
        AudioBlockRef { slot: self.slot }
    }
}

impl Drop for AudioBlockRef {
    fn drop(&mut self) {
        POOL.dec_ref(self.slot);
    }
}

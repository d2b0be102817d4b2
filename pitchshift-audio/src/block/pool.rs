use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_SIZE};

const _: () = assert!(POOL_SIZE <= 32, "slot bitmap is a u32");

/// Storage for one audio block: 128 signed 16-bit samples, 4-byte aligned.
#[repr(C, align(4))]
pub struct AudioBlockData {
    pub samples: [i16; AUDIO_BLOCK_SAMPLES],
}

impl AudioBlockData {
    const fn zeroed() -> Self {
        AudioBlockData {
            samples: [0i16; AUDIO_BLOCK_SAMPLES],
        }
    }
}

/// Fixed arena of audio blocks shared by every pipeline stage.
///
/// Slot ownership is tracked by an atomic bitmap; each slot carries its own
/// reference count so a block can fan out to several consumers (the granular
/// output feeds both the mixer and the reverb). The arena is sized once at
/// compile time and never grows, so allocation on the audio path is bounded.
pub struct AudioBlockPool {
    /// Bit N set = slot N in use.
    bitmap: AtomicU32,
    refcounts: [AtomicU8; POOL_SIZE],
    storage: UnsafeCell<[MaybeUninit<AudioBlockData>; POOL_SIZE]>,
}

// SAFETY: all shared bookkeeping is atomic. A slot's storage is only touched
// by the holder of the bitmap bit (exclusive) or through shared handles that
// never write.
unsafe impl Sync for AudioBlockPool {}

impl AudioBlockPool {
    #[allow(clippy::declare_interior_mut_const)]
    const fn new() -> Self {
        const ZERO_REFCOUNT: AtomicU8 = AtomicU8::new(0);
        AudioBlockPool {
            bitmap: AtomicU32::new(0),
            refcounts: [ZERO_REFCOUNT; POOL_SIZE],
            storage: UnsafeCell::new(unsafe {
                MaybeUninit::<[MaybeUninit<AudioBlockData>; POOL_SIZE]>::zeroed().assume_init()
            }),
        }
    }

    /// Claim a free slot, zero it and return its index with refcount 1.
    ///
    /// Returns `None` when every slot is in use.
    pub fn alloc(&self) -> Option<u8> {
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);
            let slot = (!bitmap).trailing_zeros();
            if slot >= POOL_SIZE as u32 {
                return None;
            }
            let bit = 1u32 << slot;
            if self
                .bitmap
                .compare_exchange_weak(bitmap, bitmap | bit, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }

            self.refcounts[slot as usize].store(1, Ordering::Release);
            // SAFETY: the CAS above made this slot ours alone.
            unsafe {
                let block_ptr = (*self.storage.get())[slot as usize].as_mut_ptr();
                *block_ptr = AudioBlockData::zeroed();
            }
            return Some(slot as u8);
        }
    }

    /// Add a reference to an allocated slot.
    pub fn inc_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < POOL_SIZE);
        let old = self.refcounts[slot as usize].fetch_add(1, Ordering::AcqRel);
        debug_assert!(old > 0, "inc_ref on unallocated slot");
        debug_assert!(old < 255, "refcount overflow");
    }

    /// Drop a reference; the slot returns to the free set when the count hits zero.
    pub fn dec_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < POOL_SIZE);
        let old = self.refcounts[slot as usize].fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "dec_ref on slot with refcount 0");
        if old == 1 {
            self.bitmap.fetch_and(!(1u32 << slot as u32), Ordering::Release);
        }
    }

    pub fn refcount(&self, slot: u8) -> u8 {
        self.refcounts[slot as usize].load(Ordering::Acquire)
    }

    /// Pointer to a slot's sample storage.
    ///
    /// # Safety
    /// The slot must currently be allocated.
    pub unsafe fn data_ptr(&self, slot: u8) -> *mut AudioBlockData {
        unsafe { (*self.storage.get())[slot as usize].as_mut_ptr() }
    }

    /// Number of slots currently handed out.
    pub fn allocated_count(&self) -> u32 {
        self.bitmap.load(Ordering::Acquire).count_ones()
    }

    /// Number of slots still available.
    pub fn free_count(&self) -> u32 {
        POOL_SIZE as u32 - self.allocated_count()
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.bitmap.store(0, Ordering::Release);
        for rc in &self.refcounts {
            rc.store(0, Ordering::Release);
        }
    }
}

/// The process-wide block arena.
pub static POOL: AudioBlockPool = AudioBlockPool::new();

/// Serializes tests that use the global pool and hands each one an empty arena.
///
/// Hold the returned guard for the whole test, declared before any block.
#[cfg(test)]
pub(crate) fn pool_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let guard = LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    POOL.reset();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_slot() {
        let _pool = pool_guard();
        let slot = POOL.alloc().unwrap();
        assert!((slot as usize) < POOL_SIZE);
        assert_eq!(POOL.refcount(slot), 1);
        let data = unsafe { &*POOL.data_ptr(slot) };
        assert!(data.samples.iter().all(|&s| s == 0));
        POOL.dec_ref(slot);
    }

    #[test]
    fn exhaustion_then_recovery() {
        let _pool = pool_guard();
        let mut slots = [0u8; POOL_SIZE];
        for s in slots.iter_mut() {
            *s = POOL.alloc().unwrap();
        }
        assert_eq!(POOL.free_count(), 0);
        assert!(POOL.alloc().is_none());

        POOL.dec_ref(slots[3]);
        assert_eq!(POOL.alloc(), Some(slots[3]));

        for s in slots {
            POOL.dec_ref(s);
        }
        assert_eq!(POOL.allocated_count(), 0);
    }

    #[test]
    fn shared_slot_freed_on_last_release() {
        let _pool = pool_guard();
        let slot = POOL.alloc().unwrap();
        POOL.inc_ref(slot);
        assert_eq!(POOL.refcount(slot), 2);

        POOL.dec_ref(slot);
        assert_eq!(POOL.allocated_count(), 1);
        POOL.dec_ref(slot);
        assert_eq!(POOL.allocated_count(), 0);
    }
}

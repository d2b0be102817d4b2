//! Lock-free single-producer single-consumer ring.
//!
//! Carries audio blocks between pipeline stages and command lines from a
//! reader thread to the tick loop. Neither side ever blocks: a full ring
//! hands the value back, an empty ring returns `None`.
//!
//! # Contract
//!
//! - At most one context calls [`push`](SpscQueue::push) at a time.
//! - At most one context calls [`pop`](SpscQueue::pop) at a time.
//! - The two sides may run concurrently.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Bounded SPSC ring with `N` slots, one of which stays empty to tell full
/// from empty. Usable capacity is `N - 1`.
pub struct SpscQueue<T, const N: usize> {
    slots: [UnsafeCell<MaybeUninit<T>>; N],
    /// Next slot to write; advanced only by the producer.
    head: AtomicUsize,
    /// Next slot to read; advanced only by the consumer.
    tail: AtomicUsize,
}

// SAFETY: values cross contexts, hence `T: Send`. Each index is written by
// exactly one side and slot contents are published with release/acquire on
// the index that hands them over.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}
unsafe impl<T: Send, const N: usize> Send for SpscQueue<T, N> {}

impl<T, const N: usize> SpscQueue<T, N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "SPSC ring needs at least 2 slots");
        SpscQueue {
            // SAFETY: an array of `UnsafeCell<MaybeUninit<T>>` needs no initialisation.
            slots: unsafe { MaybeUninit::<[UnsafeCell<MaybeUninit<T>>; N]>::uninit().assume_init() },
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side. Hands `val` back if the ring is full.
    pub fn push(&self, val: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            return Err(val);
        }
        // SAFETY: only the producer writes at `head`, and `next != tail`
        // means the consumer is not reading this slot.
        unsafe { (*self.slots[head].get()).write(val) };
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Consumer side.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: `tail != head`, so the producer finished writing this slot
        // and will not touch it until `tail` moves past it.
        let val = unsafe { (*self.slots[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(val)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        (self.head.load(Ordering::Acquire) + 1) % N == self.tail.load(Ordering::Acquire)
    }

    /// Items currently queued. A snapshot if the other side is active.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

impl<T, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use std::string::{String, ToString};
    use std::sync::Arc;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn fifo_until_full() {
        let q: SpscQueue<i32, 4> = SpscQueue::new();
        assert_eq!(q.capacity(), 3);
        assert!(q.is_empty());
        for v in 1..=3 {
            q.push(v).unwrap();
        }
        assert!(q.is_full());
        assert_eq!(q.push(4), Err(4));
        assert_eq!(q.len(), 3);
        assert_eq!((q.pop(), q.pop(), q.pop(), q.pop()), (Some(1), Some(2), Some(3), None));
    }

    #[test]
    fn indices_wrap() {
        let q: SpscQueue<u32, 3> = SpscQueue::new();
        for round in 0..10 {
            q.push(round).unwrap();
            q.push(round + 100).unwrap();
            assert_eq!(q.pop(), Some(round));
            assert_eq!(q.len(), 1);
            assert_eq!(q.pop(), Some(round + 100));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn drop_releases_queued_values() {
        let marker = Arc::new(());
        {
            let q: SpscQueue<Arc<()>, 4> = SpscQueue::new();
            q.push(marker.clone()).unwrap();
            q.push(marker.clone()).unwrap();
            assert_eq!(Arc::strong_count(&marker), 3);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn lines_cross_threads_in_order() {
        let q: Arc<SpscQueue<String, 8>> = Arc::new(SpscQueue::new());
        let producer = {
            let q = q.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let mut line = std::format!("PITCH {i}");
                    while let Err(back) = q.push(line) {
                        line = back;
                        std::thread::yield_now();
                    }
                }
            })
        };

        let mut got = Vec::new();
        while got.len() < 200 {
            match q.pop() {
                Some(line) => got.push(line),
                None => std::thread::yield_now(),
            }
        }
        producer.join().unwrap();
        for (i, line) in got.iter().enumerate() {
            assert_eq!(*line, std::format!("PITCH {i}"));
        }
        assert_eq!(got[0], "PITCH 0".to_string());
    }
}

//! Bounded pool of session slots.
//!
//! The slot counter is the only state shared between sessions. A slot is
//! taken with a compare-and-swap on arrival and given back when the
//! [`PoolSlot`] guard drops, including when the session task panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct PoolInner {
    capacity: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

impl SessionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                in_use: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Take a slot, or `None` if every slot is busy. Never waits.
    pub fn try_acquire(&self) -> Option<PoolSlot> {
        let mut current = self.inner.in_use.load(Ordering::Acquire);
        loop {
            if current >= self.inner.capacity {
                return None;
            }
            match self.inner.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.inner.peak.fetch_max(current + 1, Ordering::AcqRel);
                    return Some(PoolSlot {
                        inner: self.inner.clone(),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.in_use())
    }

    /// Highest number of slots held at once
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Acquire)
    }
}

/// A held slot; released on drop
#[derive(Debug)]
pub struct PoolSlot {
    inner: Arc<PoolInner>,
}

impl Drop for PoolSlot {
    fn drop(&mut self) {
        self.inner.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

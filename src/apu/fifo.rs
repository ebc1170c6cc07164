/*!
Single-producer/single-consumer stereo sample ring.

The emulation thread pushes at the configured sample rate; the host audio
thread pops on its own cadence. Indices are monotonically published with
release stores and observed with acquire loads, so a popped slot is fully
written before the consumer reads it. When the ring is full the incoming
sample is dropped rather than blocking: an underfed host thread must not
stall emulation.
*/

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SAMPLE_FIFO_CAP: usize = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StereoSample {
    pub l: i16,
    pub r: i16,
}

pub struct SampleFifo {
    data: UnsafeCell<[StereoSample; SAMPLE_FIFO_CAP]>,
    /// Owned by the producer; consumers only load it.
    write: AtomicUsize,
    /// Owned by the consumer; the producer only loads it.
    read: AtomicUsize,
}

// One producer and one consumer may touch disjoint slots concurrently;
// the index protocol below keeps them disjoint.
unsafe impl Sync for SampleFifo {}
unsafe impl Send for SampleFifo {}

impl SampleFifo {
    pub fn new() -> Self {
        SampleFifo {
            data: UnsafeCell::new([StereoSample::default(); SAMPLE_FIFO_CAP]),
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
        }
    }

    /// Producer side. Returns false when the ring is full (sample
    /// dropped).
    pub fn push(&self, sample: StereoSample) -> bool {
        let w = self.write.load(Ordering::Relaxed);
        let next = (w + 1) % SAMPLE_FIFO_CAP;
        if next == self.read.load(Ordering::Acquire) {
            return false;
        }
        unsafe {
            (*self.data.get())[w] = sample;
        }
        self.write.store(next, Ordering::Release);
        true
    }

    /// Consumer side.
    pub fn pop(&self) -> Option<StereoSample> {
        let r = self.read.load(Ordering::Relaxed);
        if r == self.write.load(Ordering::Acquire) {
            return None;
        }
        let sample = unsafe { (*self.data.get())[r] };
        self.read.store((r + 1) % SAMPLE_FIFO_CAP, Ordering::Release);
        Some(sample)
    }

    pub fn len(&self) -> usize {
        let r = self.read.load(Ordering::Acquire);
        let w = self.write.load(Ordering::Acquire);
        (w + SAMPLE_FIFO_CAP - r) % SAMPLE_FIFO_CAP
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SampleFifo {
    fn default() -> Self {
        SampleFifo::new()
    }
}

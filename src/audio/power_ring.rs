// PowerRing - lock-free hand-off of block power from the audio thread
//
// The input callback must not block or allocate, so instead of shipping raw
// sample buffers it reduces every callback block to a sum of squares and a
// frame count and pushes that pair into an SPSC ring buffer. The sampler
// drains the ring once per tick and averages over every block it received.
//
// Buffer flow:
// 1. Audio thread reduces the block to BlockPower
// 2. Audio thread pushes BlockPower (dropped and counted if the ring is full)
// 3. Sampler pops all pending BlockPower values at tick time
// 4. Sampler returns the frame-weighted mean square

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

/// Configuration constant for ring capacity (blocks)
pub const DEFAULT_RING_CAPACITY: usize = 256;

/// Power summary of one audio callback block (first channel only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockPower {
    pub sum_squares: f64,
    pub frames: u32,
}

impl BlockPower {
    /// Reduce a block of normalized samples to its power summary.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut sum_squares = 0.0_f64;
        let mut frames = 0_u32;
        for sample in samples {
            let s = sample as f64;
            sum_squares += s * s;
            frames = frames.saturating_add(1);
        }
        Self {
            sum_squares,
            frames,
        }
    }
}

/// Audio-thread half of the ring
pub struct PowerProducer {
    producer: Producer<BlockPower>,
    dropped: Arc<AtomicU64>,
}

impl PowerProducer {
    /// Push one block; never blocks. Returns `false` if the ring was full.
    pub fn push(&mut self, block: BlockPower) -> bool {
        if block.frames == 0 {
            return true;
        }
        match self.producer.push(block) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

/// Sampler half of the ring
pub struct PowerConsumer {
    consumer: Consumer<BlockPower>,
    dropped: Arc<AtomicU64>,
}

impl PowerConsumer {
    /// Drain every pending block and return the mean square over all frames.
    ///
    /// Returns `None` when no block arrived since the previous drain.
    pub fn drain_mean_square(&mut self) -> Option<f64> {
        let mut sum_squares = 0.0_f64;
        let mut frames = 0_u64;
        while let Ok(block) = self.consumer.pop() {
            sum_squares += block.sum_squares;
            frames += block.frames as u64;
        }
        if frames == 0 {
            None
        } else {
            Some(sum_squares / frames as f64)
        }
    }

    /// Blocks dropped by the audio thread because the ring was full.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a connected producer/consumer pair
///
/// # Panics
/// Panics if capacity is 0
pub fn power_ring(capacity: usize) -> (PowerProducer, PowerConsumer) {
    assert!(capacity > 0, "capacity must be greater than 0");
    let (producer, consumer) = RingBuffer::new(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        PowerProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        PowerConsumer { consumer, dropped },
    )
}

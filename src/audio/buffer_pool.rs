// BufferPool - lock-free hand-off of captured blocks to the analysis thread
//
// Two SPSC ring buffers circulate a fixed set of pre-allocated buffers:
// - DATA queue: capture callback pushes filled buffers, analysis thread pops
// - POOL queue: analysis thread returns drained buffers, capture callback reuses
//
// The capture callback never allocates as long as blocks fit the buffer
// capacity. When the analysis thread falls behind and the pool runs dry,
// the block is dropped and counted rather than blocking the audio thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer};

/// Configuration constants for buffer pool
pub const DEFAULT_BUFFER_COUNT: usize = 16;
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Audio buffer type - pre-allocated vector of f32 samples
pub type AudioBuffer = Vec<f32>;

/// Capture-callback side of the pool
pub struct CaptureChannels {
    data_producer: Producer<AudioBuffer>,
    pool_consumer: Consumer<AudioBuffer>,
    dropped_blocks: Arc<AtomicU64>,
}

/// Analysis-thread side of the pool
pub struct AnalysisChannels {
    data_consumer: Consumer<AudioBuffer>,
    pool_producer: Producer<AudioBuffer>,
    dropped_blocks: Arc<AtomicU64>,
}

/// Lock-free buffer pool using dual SPSC ring buffers
///
/// # Example
/// ```
/// use golf_tempo_trainer::audio::buffer_pool::BufferPool;
///
/// let (mut capture, mut analysis) = BufferPool::new(4, 256);
/// assert!(capture.push_block(&[0.25; 128]));
/// let block = analysis.pop_block().unwrap();
/// assert_eq!(block.len(), 128);
/// analysis.recycle(block);
/// ```
pub struct BufferPool;

impl BufferPool {
    /// Pre-allocates `buffer_count` buffers of `buffer_size` samples each.
    ///
    /// # Panics
    /// Panics if buffer_count is 0 or buffer_size is 0
    #[allow(clippy::new_ret_no_self)]
    pub fn new(buffer_count: usize, buffer_size: usize) -> (CaptureChannels, AnalysisChannels) {
        assert!(buffer_count > 0, "buffer_count must be greater than 0");
        assert!(buffer_size > 0, "buffer_size must be greater than 0");

        let (mut pool_producer, pool_consumer) = rtrb::RingBuffer::new(buffer_count);
        let (data_producer, data_consumer) = rtrb::RingBuffer::new(buffer_count);

        // The only place where heap allocation occurs
        for _ in 0..buffer_count {
            if pool_producer
                .push(Vec::with_capacity(buffer_size))
                .is_err()
            {
                break;
            }
        }

        let dropped_blocks = Arc::new(AtomicU64::new(0));
        (
            CaptureChannels {
                data_producer,
                pool_consumer,
                dropped_blocks: Arc::clone(&dropped_blocks),
            },
            AnalysisChannels {
                data_consumer,
                pool_producer,
                dropped_blocks,
            },
        )
    }
}

impl CaptureChannels {
    /// Copies `samples` into a pooled buffer and queues it for analysis.
    ///
    /// Returns false (and counts a dropped block) when no buffer is free.
    pub fn push_block(&mut self, samples: &[f32]) -> bool {
        match self.pool_consumer.pop() {
            Ok(mut buffer) => {
                buffer.clear();
                buffer.extend_from_slice(samples);
                if self.data_producer.push(buffer).is_err() {
                    self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                true
            }
            Err(_) => {
                self.dropped_blocks.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

impl AnalysisChannels {
    pub fn pop_block(&mut self) -> Option<AudioBuffer> {
        self.data_consumer.pop().ok()
    }

    /// Returns a drained buffer to the capture side.
    pub fn recycle(&mut self, buffer: AudioBuffer) {
        let _ = self.pool_producer.push(buffer);
    }

    /// Blocks dropped because the pool was exhausted.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }
}

//! Staging buffer pool: fixed-size, pre-warmed chunks for CPU-to-GPU
//! uploads (spec §4.10). Pre-warming at construction avoids first-frame
//! allocation stalls.

use std::sync::Mutex;

use thiserror::Error;

/// A staging chunk's size class. Actual byte sizes are nominal defaults;
/// real deployments size these from the device budget manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkSize {
    Small,
    Medium,
    Large,
}

impl ChunkSize {
    pub fn bytes(self) -> u64 {
        match self {
            Self::Small => 64 * 1024,
            Self::Medium => 1024 * 1024,
            Self::Large => 16 * 1024 * 1024,
        }
    }

    fn smallest_fitting(size: u64) -> Option<Self> {
        [Self::Small, Self::Medium, Self::Large].into_iter().find(|c| size <= c.bytes())
    }
}

/// One fixed-size staging chunk handed out by [`StagingBufferPool::acquire`].
#[derive(Debug)]
pub struct StagingChunk {
    pub id: u32,
    pub size: ChunkSize,
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("no staging chunk available for requested size {0} bytes")]
    Exhausted(u64),
}

struct Pools {
    small: Vec<StagingChunk>,
    medium: Vec<StagingChunk>,
    large: Vec<StagingChunk>,
}

impl Pools {
    fn bucket(&mut self, size: ChunkSize) -> &mut Vec<StagingChunk> {
        match size {
            ChunkSize::Small => &mut self.small,
            ChunkSize::Medium => &mut self.medium,
            ChunkSize::Large => &mut self.large,
        }
    }
}

/// Owns a set of fixed-size staging chunks (spec §4.10). Default
/// pre-warming follows the spec's typical defaults: 4 small, 2 medium, 2
/// large.
pub struct StagingBufferPool {
    pools: Mutex<Pools>,
}

impl StagingBufferPool {
    pub fn new() -> Self {
        Self::with_counts(4, 2, 2)
    }

    pub fn with_counts(small: usize, medium: usize, large: usize) -> Self {
        let mut next_id = 0u32;
        let mut make = |size: ChunkSize, count: usize| -> Vec<StagingChunk> {
            (0..count)
                .map(|_| {
                    next_id += 1;
                    StagingChunk { id: next_id, size }
                })
                .collect()
        };
        Self {
            pools: Mutex::new(Pools {
                small: make(ChunkSize::Small, small),
                medium: make(ChunkSize::Medium, medium),
                large: make(ChunkSize::Large, large),
            }),
        }
    }

    /// `Acquire(size)`: returns the smallest chunk class that fits `size`.
    pub fn acquire(&self, size: u64) -> Result<StagingChunk, StagingError> {
        let class = ChunkSize::smallest_fitting(size).ok_or(StagingError::Exhausted(size))?;
        self.pools.lock().unwrap().bucket(class).pop().ok_or(StagingError::Exhausted(size))
    }

    /// `Release(chunk)`: returns a chunk to its size class's free list.
    pub fn release(&self, chunk: StagingChunk) {
        let mut pools = self.pools.lock().unwrap();
        let size = chunk.size;
        pools.bucket(size).push(chunk);
    }

    pub fn available(&self, size: ChunkSize) -> usize {
        self.pools.lock().unwrap().bucket(size).len()
    }
}

impl Default for StagingBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_warms_the_default_chunk_counts() {
        let pool = StagingBufferPool::new();
        assert_eq!(pool.available(ChunkSize::Small), 4);
        assert_eq!(pool.available(ChunkSize::Medium), 2);
        assert_eq!(pool.available(ChunkSize::Large), 2);
    }

    #[test]
    fn acquire_picks_the_smallest_fitting_class() {
        let pool = StagingBufferPool::new();
        let chunk = pool.acquire(128 * 1024).unwrap();
        assert_eq!(chunk.size, ChunkSize::Medium);
    }

    #[test]
    fn exhausted_class_fails_acquire() {
        let pool = StagingBufferPool::with_counts(1, 0, 0);
        let _first = pool.acquire(1024).unwrap();
        assert!(matches!(pool.acquire(1024), Err(StagingError::Exhausted(_))));
    }

    #[test]
    fn released_chunk_is_reusable() {
        let pool = StagingBufferPool::with_counts(1, 0, 0);
        let chunk = pool.acquire(1024).unwrap();
        let id = chunk.id;
        pool.release(chunk);
        let reacquired = pool.acquire(1024).unwrap();
        assert_eq!(reacquired.id, id);
    }

    #[test]
    fn oversized_request_is_rejected() {
        let pool = StagingBufferPool::new();
        assert!(matches!(pool.acquire(u64::MAX), Err(StagingError::Exhausted(_))));
    }
}

use crate::error::{HarnessError, Result};

/// Harness block size in bits
pub const BLOCK_BITS: usize = 256;
/// Harness block size in bytes
pub const BLOCK_BYTES: usize = BLOCK_BITS / 8;
/// Blocks per chunk unless overridden
pub const DEFAULT_CHUNK_BLOCKS: usize = 1024;

/// Shape of one chunk: a fixed number of fixed-size blocks.
///
/// The block count is part of the transform contract: the primitive is
/// always told `block_count`, never the number of bytes actually read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    block_count: usize,
    block_bytes: usize,
}

impl ChunkLayout {
    pub fn new(block_count: usize) -> Result<Self> {
        Self::with_block_bytes(block_count, BLOCK_BYTES)
    }

    pub fn with_block_bytes(block_count: usize, block_bytes: usize) -> Result<Self> {
        if block_count == 0 || block_bytes == 0 || block_count.checked_mul(block_bytes).is_none() {
            return Err(HarnessError::InvalidChunkLayout {
                block_count,
                block_bytes,
            });
        }
        Ok(Self {
            block_count,
            block_bytes,
        })
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Chunk capacity in bytes
    pub fn capacity(&self) -> usize {
        self.block_count * self.block_bytes
    }

    /// Number of chunks needed to cover `total` bytes
    pub fn iterations_for(&self, total: u64) -> u64 {
        total.div_ceil(self.capacity() as u64)
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_CHUNK_BLOCKS,
            block_bytes: BLOCK_BYTES,
        }
    }
}

/// Single reusable chunk buffer, zeroed before every reuse
pub struct ChunkBuffer {
    layout: ChunkLayout,
    data: Vec<u8>,
}

impl ChunkBuffer {
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            data: vec![0u8; layout.capacity()],
        }
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Wipe every byte so nothing from the previous chunk survives
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

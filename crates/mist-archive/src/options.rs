use std::num::NonZeroUsize;

use mist_core::config::{ArchiveConfig, DEFAULT_BLOCK_SIZE};
use mist_core::{ArchiveFormat, MistResult};

/// Knobs shared by the write and read paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub block_size: NonZeroUsize,
    /// Layout `vaporize` writes. `condense` reads whatever the header says.
    pub format: ArchiveFormat,
    /// Data blocks fetched concurrently by `condense`; 0 and 1 are sequential
    pub fetch_concurrency: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            block_size: NonZeroUsize::new(DEFAULT_BLOCK_SIZE).unwrap_or(NonZeroUsize::MIN),
            format: ArchiveFormat::Ctr,
            fetch_concurrency: 8,
        }
    }
}

impl ArchiveOptions {
    pub fn from_config(cfg: &ArchiveConfig) -> MistResult<Self> {
        Ok(Self {
            block_size: cfg.block_size()?,
            format: cfg.format,
            fetch_concurrency: cfg.fetch_concurrency,
        })
    }

    pub fn with_block_size(mut self, block_size: NonZeroUsize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }
}

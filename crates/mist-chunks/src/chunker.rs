//! Fixed-size chunking
//!
//! Every chunk except the last is exactly `block_size` bytes. The inverse
//! is plain concatenation in the same order.

use std::num::NonZeroUsize;

/// Split `data` into `ceil(len / block_size)` ordered slices.
///
/// Empty input yields no chunks.
pub fn split(data: &[u8], block_size: NonZeroUsize) -> Vec<&[u8]> {
    data.chunks(block_size.get()).collect()
}

/// Number of chunks `split` produces for `len` bytes.
pub fn chunk_count(len: usize, block_size: NonZeroUsize) -> usize {
    len.div_ceil(block_size.get())
}

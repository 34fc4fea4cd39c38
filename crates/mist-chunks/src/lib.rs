//! mist-chunks: fixed-size chunking and content addressing
//!
//! # Overview
//! - `chunker`: split a buffer into ordered `block_size` pieces (last may be short)
//! - `multihash`: sha2-256 multihash addresses, the same bytes an IPFS CIDv0 carries

pub mod chunker;
pub mod multihash;

pub use chunker::{chunk_count, split};
pub use multihash::{address_of, verify};

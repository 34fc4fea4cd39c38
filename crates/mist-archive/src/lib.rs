//! mist-archive: publish a byte stream as encrypted blocks and recover it
//!
//! - `records`: header and block-table codecs for every archive format
//! - `vaporize`: write path (chunk, encrypt, put, table, header)
//! - `condense`: read path (header, table, fetch, decrypt in order)
//! - `chain`: predecessor-linked block layout used by the `chain` format

pub mod chain;
pub mod condense;
pub mod options;
pub mod records;
pub mod vaporize;

pub use condense::{condense, condense_to_file, Condenser};
pub use options::ArchiveOptions;
pub use records::{ArchiveHeader, BlockTable, ChainHeader, Header, SealedHeader};
pub use vaporize::{vaporize, vaporize_file, Stage, VaporizeReport, Vaporizer};

/// HKDF domain for the sealed-format block key
pub(crate) const SEALED_BLOCKS_DOMAIN: &[u8] = b"mist-sealed-blocks";
/// HKDF domain for the sealed-format table key
pub(crate) const SEALED_TABLE_DOMAIN: &[u8] = b"mist-sealed-table";

/// Progress callback type (done, total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

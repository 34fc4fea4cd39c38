//! mist-store: content-addressed block stores behind one `BlockStore` trait
//!
//! Backends:
//! - `operator`: OpenDAL memory / local fs / S3-compatible
//! - `ipfs`: a local IPFS daemon over its HTTP API

pub mod ipfs;
pub mod operator;
pub mod traits;

use std::time::Duration;

use mist_core::config::{StoreBackend, StoreConfig};
use mist_core::MistResult;

pub use ipfs::IpfsStore;
pub use operator::{OperatorStore, S3Credentials};
pub use traits::BlockStore;

/// Build the store selected by `[store] backend`.
pub fn open_store(cfg: &StoreConfig) -> MistResult<Box<dyn BlockStore>> {
    let store: Box<dyn BlockStore> = match cfg.backend {
        StoreBackend::Ipfs => Box::new(IpfsStore::new(
            &cfg.ipfs_api,
            Duration::from_secs(cfg.request_timeout_secs),
            cfg.max_block_size,
        )?),
        StoreBackend::Fs => Box::new(OperatorStore::fs(
            &cfg.root,
            &cfg.prefix,
            cfg.max_block_size,
        )?),
        StoreBackend::S3 => Box::new(OperatorStore::s3(cfg, &S3Credentials::from_env()?)?),
        StoreBackend::Memory => Box::new(OperatorStore::memory(cfg.max_block_size)?),
    };
    tracing::debug!(backend = ?cfg.backend, "block store opened");
    Ok(store)
}

//! Block store capability trait

use async_trait::async_trait;

use mist_core::{Address, MistResult};

/// Content-addressed block storage: exactly `put` and `get`.
///
/// The store assigns the address as a function of the block's bytes, so
/// putting identical bytes twice yields the same address. Blocks are never
/// mutated or deleted through this interface.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block and return its content address.
    ///
    /// Fails with `StoreUnavailable`, or `BlockTooLarge` when the block
    /// exceeds the store's limit.
    async fn put(&self, block: &[u8]) -> MistResult<Address>;

    /// Retrieve a block by address.
    ///
    /// Returns `NotFound` if no block with that address was stored.
    async fn get(&self, address: &Address) -> MistResult<Vec<u8>>;
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Box<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        (**self).put(block).await
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        (**self).get(address).await
    }
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for std::sync::Arc<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        (**self).put(block).await
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        (**self).get(address).await
    }
}

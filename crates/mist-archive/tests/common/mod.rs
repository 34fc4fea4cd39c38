#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use mist_core::{Address, MistError, MistResult};
use mist_store::{BlockStore, OperatorStore};

/// Deterministic pseudo-random bytes (xorshift64)
pub fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

pub fn memory_store() -> OperatorStore {
    OperatorStore::memory(1024 * 1024).unwrap()
}

/// Wraps a store and records every put, in order.
pub struct RecordingStore<S> {
    pub inner: S,
    pub puts: Mutex<Vec<(Address, usize)>>,
    pub gets: Mutex<Vec<Address>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            puts: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn put_sizes(&self) -> Vec<usize> {
        self.puts.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for RecordingStore<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        let addr = self.inner.put(block).await?;
        self.puts.lock().unwrap().push((addr, block.len()));
        Ok(addr)
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        self.gets.lock().unwrap().push(*address);
        self.inner.get(address).await
    }
}

/// Accepts `allowed_puts` puts, then reports the store as unavailable.
pub struct FailingStore<S> {
    pub inner: S,
    pub allowed_puts: usize,
    pub seen: Mutex<usize>,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S, allowed_puts: usize) -> Self {
        Self {
            inner,
            allowed_puts,
            seen: Mutex::new(0),
        }
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for FailingStore<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        {
            let mut seen = self.seen.lock().unwrap();
            if *seen >= self.allowed_puts {
                return Err(MistError::StoreUnavailable("injected failure".into()));
            }
            *seen += 1;
        }
        self.inner.put(block).await
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        self.inner.get(address).await
    }
}

/// Flips the first byte of one chosen block on every `get`.
pub struct TamperingStore<S> {
    pub inner: S,
    pub target: Mutex<Option<Address>>,
}

impl<S> TamperingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            target: Mutex::new(None),
        }
    }

    pub fn corrupt(&self, address: Address) {
        *self.target.lock().unwrap() = Some(address);
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for TamperingStore<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        self.inner.put(block).await
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        let mut block = self.inner.get(address).await?;
        let target = *self.target.lock().unwrap();
        if target == Some(*address) {
            if let Some(first) = block.first_mut() {
                *first ^= 0xFF;
            }
        }
        Ok(block)
    }
}

/// Sleeps a per-address delay on every `get`, so concurrent fetches
/// complete out of order.
pub struct SlowStore<S> {
    pub inner: S,
    pub completed: Mutex<Vec<Address>>,
}

impl<S> SlowStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            completed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for SlowStore<S> {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        self.inner.put(block).await
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        let delay = u64::from(address.as_bytes()[5] % 20);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        let block = self.inner.get(address).await?;
        self.completed.lock().unwrap().push(*address);
        Ok(block)
    }
}

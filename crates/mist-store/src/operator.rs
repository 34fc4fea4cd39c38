//! OpenDAL-backed block store (memory, local fs, S3-compatible)
//!
//! Blocks live at `{prefix}/blocks/{base58 address}`. The address is the
//! sha2-256 multihash of the block, computed locally, so the same bytes land
//! at the same key on every backend and match what an IPFS node would assign.

use std::path::Path;

use async_trait::async_trait;
use opendal::Operator;

use mist_core::config::{expand_tilde, StoreConfig};
use mist_core::{Address, MistError, MistResult};

use crate::traits::BlockStore;

/// S3 credentials, sourced from the environment
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl S3Credentials {
    /// Read `MIST_S3_ACCESS_KEY_ID`/`MIST_S3_SECRET_ACCESS_KEY`, falling back to
    /// the standard `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`.
    pub fn from_env() -> MistResult<Self> {
        let access_key_id = env_either("MIST_S3_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID");
        let secret_access_key = env_either("MIST_S3_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY");
        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Self {
                access_key_id,
                secret_access_key,
            }),
            _ => Err(MistError::Config(
                "S3 credentials not set: export AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY".into(),
            )),
        }
    }
}

fn env_either(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .ok()
        .filter(|v| !v.is_empty())
}

/// A [`BlockStore`] over any OpenDAL operator
#[derive(Debug, Clone)]
pub struct OperatorStore {
    op: Operator,
    prefix: String,
    max_block_size: usize,
}

impl OperatorStore {
    pub fn new(op: Operator, prefix: impl Into<String>, max_block_size: usize) -> Self {
        Self {
            op,
            prefix: prefix.into().trim_matches('/').to_string(),
            max_block_size,
        }
    }

    /// Process-local store backed by OpenDAL's memory service.
    pub fn memory(max_block_size: usize) -> MistResult<Self> {
        let op = Operator::new(opendal::services::Memory::default())
            .map_err(store_err)?
            .finish();
        Ok(Self::new(op, "mist", max_block_size))
    }

    /// Store rooted at a local directory.
    pub fn fs(root: &Path, prefix: &str, max_block_size: usize) -> MistResult<Self> {
        let root = expand_tilde(root);
        let builder = opendal::services::Fs::default().root(&root.to_string_lossy());
        let op = Operator::new(builder)
            .map_err(store_err)?
            .layer(opendal::layers::LoggingLayer::default())
            .finish();
        Ok(Self::new(op, prefix, max_block_size))
    }

    /// S3-compatible store (path-style addressing, retries with jitter).
    ///
    /// If `enforce_tls` is set and the endpoint is plain HTTP this fails;
    /// otherwise a warning is logged for non-HTTPS endpoints.
    pub fn s3(cfg: &StoreConfig, creds: &S3Credentials) -> MistResult<Self> {
        if cfg.endpoint.starts_with("http://") {
            if cfg.enforce_tls {
                return Err(MistError::Config(format!(
                    "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                     Use an HTTPS endpoint or set store.enforce_tls = false for local development.",
                    cfg.endpoint
                )));
            }
            tracing::warn!(
                endpoint = %cfg.endpoint,
                "S3 endpoint uses plaintext HTTP; credentials are transmitted unencrypted"
            );
        }

        // opendal 0.55: consuming builder, path-style addressing by default
        let builder = opendal::services::S3::default()
            .endpoint(&cfg.endpoint)
            .region(&cfg.region)
            .bucket(&cfg.bucket)
            .access_key_id(&creds.access_key_id)
            .secret_access_key(&creds.secret_access_key);

        let op = Operator::new(builder)
            .map_err(store_err)?
            .layer(opendal::layers::LoggingLayer::default())
            .layer(
                opendal::layers::RetryLayer::new()
                    .with_max_times(5)
                    .with_jitter(),
            )
            .finish();

        Ok(Self::new(op, cfg.prefix.as_str(), cfg.max_block_size))
    }

    /// Storage key for a block address
    pub fn key_for(&self, address: &Address) -> String {
        if self.prefix.is_empty() {
            format!("blocks/{}", address.to_base58())
        } else {
            format!("{}/blocks/{}", self.prefix, address.to_base58())
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }
}

#[async_trait]
impl BlockStore for OperatorStore {
    async fn put(&self, block: &[u8]) -> MistResult<Address> {
        if block.len() > self.max_block_size {
            return Err(MistError::BlockTooLarge {
                size: block.len(),
                limit: self.max_block_size,
            });
        }

        let address = mist_chunks::address_of(block);
        let key = self.key_for(&address);
        self.op
            .write(&key, block.to_vec())
            .await
            .map_err(|e| MistError::StoreUnavailable(format!("writing {key}: {e}")))?;

        tracing::debug!(%address, bytes = block.len(), "block stored");
        Ok(address)
    }

    async fn get(&self, address: &Address) -> MistResult<Vec<u8>> {
        let key = self.key_for(address);
        let data = self.op.read(&key).await.map_err(|e| {
            if e.kind() == opendal::ErrorKind::NotFound {
                MistError::NotFound(address.to_base58())
            } else {
                MistError::StoreUnavailable(format!("reading {key}: {e}"))
            }
        })?;
        let data = data.to_vec();

        if !mist_chunks::verify(address, &data) {
            return Err(MistError::CorruptBlock(address.to_base58()));
        }
        Ok(data)
    }
}

fn store_err(e: opendal::Error) -> MistError {
    MistError::StoreUnavailable(format!("creating OpenDAL operator: {e}"))
}
